use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::students::repo_types::Student;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

/// One student's day. `time_out` set means the day is closed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub student_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time_in: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time_out: Option<OffsetDateTime>,
    pub status: AttendanceStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: Uuid,
    pub date: Date,
    pub time_in: OffsetDateTime,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceWithStudent {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student: Student,
}

/// Flat row of `attendances JOIN students`, student columns prefixed `s_`.
#[derive(Debug, FromRow)]
pub struct AttendanceStudentRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: Date,
    pub time_in: Option<OffsetDateTime>,
    pub time_out: Option<OffsetDateTime>,
    pub status: AttendanceStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub s_nfc_uid: String,
    pub s_name: String,
    pub s_class: String,
    pub s_student_number: String,
    pub s_school_id: Uuid,
    pub s_is_active: bool,
    pub s_created_at: OffsetDateTime,
    pub s_updated_at: OffsetDateTime,
}

impl From<AttendanceStudentRow> for AttendanceWithStudent {
    fn from(r: AttendanceStudentRow) -> Self {
        Self {
            student: Student {
                id: r.student_id,
                nfc_uid: r.s_nfc_uid,
                name: r.s_name,
                class: r.s_class,
                student_number: r.s_student_number,
                school_id: r.s_school_id,
                is_active: r.s_is_active,
                created_at: r.s_created_at,
                updated_at: r.s_updated_at,
            },
            attendance: Attendance {
                id: r.id,
                student_id: r.student_id,
                date: r.date,
                time_in: r.time_in,
                time_out: r.time_out,
                status: r.status,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
        }
    }
}
