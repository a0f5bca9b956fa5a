use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::attendance::{
    repo_types::{Attendance, AttendanceStatus, AttendanceWithStudent},
    services::ScanAction,
};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Body sent by a card reader.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub nfc_uid: String,
}

/// Check-in responses carry `time_in` and `status`, check-out responses `time_out`.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub message: &'static str,
    pub action: ScanAction,
    pub student: String,
    pub class: String,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_in: Option<OffsetDateTime>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_out: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    pub attendance: Attendance,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub attendances: Vec<AttendanceWithStudent>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub attendances: Vec<Attendance>,
}
