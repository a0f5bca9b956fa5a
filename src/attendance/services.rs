use serde::Serialize;
use time::{Date, OffsetDateTime, Time, UtcOffset};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    attendance::{
        repo::{AttendanceRepo, ATTENDANCES_STUDENT_DATE_KEY},
        repo_types::{Attendance, AttendanceStatus, AttendanceWithStudent, NewAttendance},
    },
    error::{AppError, AppResult},
    students::repo_types::Student,
};

pub const HISTORY_LIMIT: i64 = 30;

/// One lost insert race is expected under a double tap; more means something else
/// keeps rewriting the row.
const SCAN_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub action: ScanAction,
    pub student: Student,
    pub attendance: Attendance,
}

/// Current wall-clock time at the school.
pub fn local_now(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

/// `check_in` must already be in the school's offset.
pub fn status_for(check_in: OffsetDateTime, late_cutoff: Time) -> AttendanceStatus {
    if check_in.time() > late_cutoff {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// Advances the card holder's day: no record → checked in → checked out.
///
/// The `(student_id, date)` unique constraint decides concurrent first scans. The
/// loser re-reads and continues as a check-out, so a day never gets two records.
pub async fn scan(
    repo: &dyn AttendanceRepo,
    late_cutoff: Time,
    nfc_uid: &str,
    now: OffsetDateTime,
) -> AppResult<ScanOutcome> {
    let nfc_uid = nfc_uid.trim();
    if nfc_uid.is_empty() {
        return Err(AppError::bad_request("nfc_uid is required"));
    }

    let Some(student) = repo.find_active_student_by_nfc(nfc_uid).await? else {
        warn!(nfc_uid, "scan of unknown or inactive card");
        return Err(AppError::not_found("Student not found or card not registered"));
    };
    let date = now.date();

    for attempt in 1..=SCAN_ATTEMPTS {
        match repo.find_for_day(student.id, date).await? {
            None => {
                let status = status_for(now, late_cutoff);
                let inserted = repo
                    .insert_check_in(NewAttendance {
                        student_id: student.id,
                        date,
                        time_in: now,
                        status,
                    })
                    .await;
                match inserted {
                    Ok(attendance) => {
                        info!(student_id = %student.id, %date, ?status, "check-in");
                        return Ok(ScanOutcome {
                            action: ScanAction::CheckIn,
                            student,
                            attendance,
                        });
                    }
                    Err(e) if e.is_unique_violation_of(ATTENDANCES_STUDENT_DATE_KEY) => {
                        debug!(student_id = %student.id, %date, attempt, "lost check-in race, retrying");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Some(existing) if existing.time_out.is_some() => {
                warn!(student_id = %student.id, %date, "scan after check-out");
                return Err(AppError::AlreadyCheckedOut);
            }
            Some(existing) => {
                let Some(attendance) = repo.set_check_out(existing.id, now).await? else {
                    warn!(student_id = %student.id, %date, "lost check-out race");
                    return Err(AppError::AlreadyCheckedOut);
                };
                info!(student_id = %student.id, %date, "check-out");
                return Ok(ScanOutcome {
                    action: ScanAction::CheckOut,
                    student,
                    attendance,
                });
            }
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "attendance for student {} on {} changed on every attempt",
        student.id,
        date
    )))
}

pub async fn history(repo: &dyn AttendanceRepo, student_id: Uuid) -> AppResult<Vec<Attendance>> {
    Ok(repo.history(student_id, HISTORY_LIMIT).await?)
}

pub async fn for_day(repo: &dyn AttendanceRepo, date: Date) -> AppResult<Vec<AttendanceWithStudent>> {
    Ok(repo.for_day(date).await?)
}
