use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::AppResult,
    extract::AppJson,
    state::AppState,
    students::{
        dto::{
            CreateSchoolRequest, RegisterCardRequest, RegisterCardResponse, SchoolResponse,
            SchoolsResponse,
        },
        services,
    },
};

/// Requires `authenticate` + `RoleSet::ADMIN`.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/nfc/register", post(register_card))
}

/// Requires `authenticate` + `RoleSet::SUPER_ADMIN`.
pub fn super_admin_routes() -> Router<AppState> {
    Router::new().route("/schools", post(create_school).get(list_schools))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn register_card(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<RegisterCardRequest>,
) -> AppResult<(StatusCode, Json<RegisterCardResponse>)> {
    let student = services::register_student(state.students.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterCardResponse {
            message: "NFC card registered successfully",
            student,
        }),
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_school(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<CreateSchoolRequest>,
) -> AppResult<(StatusCode, Json<SchoolResponse>)> {
    let school = services::register_school(state.students.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(SchoolResponse { school })))
}

#[instrument(skip(state))]
pub async fn list_schools(State(state): State<AppState>) -> AppResult<Json<SchoolsResponse>> {
    let schools = services::list_schools(state.students.as_ref()).await?;
    Ok(Json(SchoolsResponse { schools }))
}
