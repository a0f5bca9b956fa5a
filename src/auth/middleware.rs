use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    auth::{claims::Role, extractors::CurrentUser, jwt::JwtKeys},
    error::AppError,
};

/// Roles accepted by a gated route group, fixed at route registration.
#[derive(Debug, Clone, Copy)]
pub struct RoleSet {
    roles: &'static [Role],
    label: &'static str,
}

impl RoleSet {
    pub const ADMIN: RoleSet = RoleSet {
        roles: &[Role::Admin, Role::SuperAdmin],
        label: "Admin",
    };
    pub const SUPER_ADMIN: RoleSet = RoleSet {
        roles: &[Role::SuperAdmin],
        label: "Super admin",
    };

    pub fn allows(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Validates the bearer token and attaches a [`CurrentUser`] to the request.
pub async fn authenticate(
    State(keys): State<Arc<JwtKeys>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid authorization header format"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

    let claims = keys.verify(token.trim()).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::unauthorized("Invalid token")
    })?;

    req.extensions_mut().insert(CurrentUser::from(claims));
    Ok(next.run(req).await)
}

/// Must be layered inside `authenticate`.
pub async fn require_roles(
    State(allowed): State<RoleSet>,
    user: CurrentUser,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if allowed.allows(user.role) {
        return Ok(next.run(req).await);
    }
    warn!(
        user_id = %user.id,
        role = %user.role,
        required = allowed.label,
        path = %req.uri().path(),
        "role check failed"
    );
    Err(AppError::forbidden(format!(
        "Access denied. {} role required",
        allowed.label
    )))
}
