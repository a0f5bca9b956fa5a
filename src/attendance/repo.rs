use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    attendance::repo_types::{Attendance, AttendanceStudentRow, AttendanceWithStudent, NewAttendance},
    db::{PgStore, StoreResult},
    students::repo_types::Student,
};

/// Unique constraint on `attendances (student_id, date)`.
pub const ATTENDANCES_STUDENT_DATE_KEY: &str = "attendances_student_id_date_key";

#[async_trait]
pub trait AttendanceRepo: Send + Sync {
    async fn find_active_student_by_nfc(&self, nfc_uid: &str) -> StoreResult<Option<Student>>;
    async fn find_for_day(&self, student_id: Uuid, date: Date) -> StoreResult<Option<Attendance>>;
    /// Fails with a unique violation of [`ATTENDANCES_STUDENT_DATE_KEY`] when the
    /// student already has a record for that date.
    async fn insert_check_in(&self, new: NewAttendance) -> StoreResult<Attendance>;
    /// Sets `time_out` only while it is still unset. `None` means nothing changed.
    async fn set_check_out(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<Option<Attendance>>;
    /// Newest date first.
    async fn history(&self, student_id: Uuid, limit: i64) -> StoreResult<Vec<Attendance>>;
    async fn for_day(&self, date: Date) -> StoreResult<Vec<AttendanceWithStudent>>;
}

#[async_trait]
impl AttendanceRepo for PgStore {
    async fn find_active_student_by_nfc(&self, nfc_uid: &str) -> StoreResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, nfc_uid, name, class, student_number, school_id, is_active,
                   created_at, updated_at
            FROM students
            WHERE nfc_uid = $1 AND is_active
            "#,
        )
        .bind(nfc_uid)
        .fetch_optional(self.pool())
        .await?;
        Ok(student)
    }

    async fn find_for_day(&self, student_id: Uuid, date: Date) -> StoreResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, student_id, date, time_in, time_out, status, created_at, updated_at
            FROM attendances
            WHERE student_id = $1 AND date = $2
            "#,
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn insert_check_in(&self, new: NewAttendance) -> StoreResult<Attendance> {
        let row = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendances (student_id, date, time_in, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, student_id, date, time_in, time_out, status, created_at, updated_at
            "#,
        )
        .bind(new.student_id)
        .bind(new.date)
        .bind(new.time_in)
        .bind(new.status)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn set_check_out(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendances
               SET time_out = $2, updated_at = now()
             WHERE id = $1 AND time_out IS NULL
            RETURNING id, student_id, date, time_in, time_out, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn history(&self, student_id: Uuid, limit: i64) -> StoreResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, student_id, date, time_in, time_out, status, created_at, updated_at
            FROM attendances
            WHERE student_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(student_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn for_day(&self, date: Date) -> StoreResult<Vec<AttendanceWithStudent>> {
        let rows = sqlx::query_as::<_, AttendanceStudentRow>(
            r#"
            SELECT a.id, a.student_id, a.date, a.time_in, a.time_out, a.status,
                   a.created_at, a.updated_at,
                   s.nfc_uid AS s_nfc_uid, s.name AS s_name, s.class AS s_class,
                   s.student_number AS s_student_number, s.school_id AS s_school_id,
                   s.is_active AS s_is_active, s.created_at AS s_created_at,
                   s.updated_at AS s_updated_at
              FROM attendances a
              JOIN students s ON s.id = a.student_id
             WHERE a.date = $1
             ORDER BY a.time_in ASC NULLS LAST
            "#,
        )
        .bind(date)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(AttendanceWithStudent::from).collect())
    }
}
