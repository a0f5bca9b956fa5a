use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, ProfileResponse, RefreshRequest, RegisterRequest,
            TokenResponse, UsersResponse,
        },
        extractors::CurrentUser,
        services,
    },
    error::AppResult,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Requires `authenticate`.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile))
}

/// Requires `authenticate` + `RoleSet::SUPER_ADMIN`.
pub fn super_admin_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let resp = services::register_identity(state.users.as_ref(), &state.keys, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let resp = services::login(state.users.as_ref(), &state.keys, payload).await?;
    Ok(Json(resp))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = services::refresh(state.users.as_ref(), &state.keys, &payload.refresh_token).await?;
    Ok(Json(resp))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    let user = services::profile(state.users.as_ref(), user.id).await?;
    Ok(Json(ProfileResponse { user }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<UsersResponse>> {
    let users = services::list_users(state.users.as_ref()).await?;
    Ok(Json(UsersResponse {
        total: users.len(),
        users,
    }))
}
