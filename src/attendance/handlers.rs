use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    attendance::{
        dto::{HistoryResponse, ScanRequest, ScanResponse, TodayResponse},
        services::{self, local_now, ScanAction},
    },
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

/// Requires `authenticate`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendance/record", post(record))
        .route("/attendance/today", get(today))
        .route("/attendance/history/:student_id", get(history))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id, nfc_uid = %payload.nfc_uid))]
pub async fn record(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<ScanRequest>,
) -> AppResult<Json<ScanResponse>> {
    let cfg = &state.config.attendance;
    let now = local_now(cfg.utc_offset);
    let outcome =
        services::scan(state.attendance.as_ref(), cfg.late_cutoff, &payload.nfc_uid, now).await?;

    let attendance = outcome.attendance;
    let resp = match outcome.action {
        ScanAction::CheckIn => ScanResponse {
            message: "Check-in successful",
            action: ScanAction::CheckIn,
            student: outcome.student.name,
            class: outcome.student.class,
            time_in: attendance.time_in,
            time_out: None,
            status: Some(attendance.status),
            attendance,
        },
        ScanAction::CheckOut => ScanResponse {
            message: "Check-out successful",
            action: ScanAction::CheckOut,
            student: outcome.student.name,
            class: outcome.student.class,
            time_in: None,
            time_out: attendance.time_out,
            status: None,
            attendance,
        },
    };
    Ok(Json(resp))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn today(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<TodayResponse>> {
    let date = local_now(state.config.attendance.utc_offset).date();
    let attendances = services::for_day(state.attendance.as_ref(), date).await?;
    Ok(Json(TodayResponse {
        date,
        total: attendances.len(),
        attendances,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(student_id): Path<String>,
) -> AppResult<Json<HistoryResponse>> {
    let student_id = Uuid::parse_str(&student_id).map_err(|_| {
        warn!(%student_id, "malformed student id");
        AppError::bad_request("Invalid student ID")
    })?;
    let attendances = services::history(state.attendance.as_ref(), student_id).await?;
    Ok(Json(HistoryResponse { attendances }))
}
