use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{UserRepo, USERS_EMAIL_KEY},
        repo_types::NewUser,
    },
    error::{AppError, AppResult},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an active identity and logs it in.
pub async fn register_identity(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let name = req.name.trim().to_string();

    if name.is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = hash_password(&req.password)?;
    let role = req.role.unwrap_or_default();

    let user = users
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation_of(USERS_EMAIL_KEY) {
                warn!("email already registered");
                AppError::conflict("User already exists")
            } else {
                e.into()
            }
        })?;

    let pair = keys.issue_pair(user.id, &user.email, user.role)?;
    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok(AuthResponse {
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: user.into(),
    })
}

pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);

    let Some(user) = users.find_active_by_email(&email).await? else {
        warn!(email = %email, "login unknown or inactive email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&req.password, &user.password_hash) {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let pair = keys.issue_pair(user.id, &user.email, user.role)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: user.into(),
    })
}

/// Any valid token is accepted; the new access token is derived from the stored
/// identity, so role changes and deactivation take effect here.
pub async fn refresh(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    refresh_token: &str,
) -> AppResult<TokenResponse> {
    let claims = keys.verify(refresh_token).map_err(|e| {
        warn!(error = %e, "refresh with invalid token");
        AppError::unauthorized("Invalid refresh token")
    })?;

    let Some(user) = users.find_active_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "refresh for unknown or inactive user");
        return Err(AppError::unauthorized("User not found"));
    };

    let token = keys.sign_access(user.id, &user.email, user.role)?;
    info!(user_id = %user.id, "access token refreshed");
    Ok(TokenResponse { token })
}

pub async fn profile(users: &dyn UserRepo, user_id: Uuid) -> AppResult<PublicUser> {
    users
        .find_active_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn list_users(users: &dyn UserRepo) -> AppResult<Vec<PublicUser>> {
    Ok(users
        .list_users()
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::claims::Role, config::JwtConfig, db::memory::MemoryStore};

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            ttl_minutes: 60 * 24,
            refresh_ttl_minutes: 60 * 24 * 7,
        })
    }

    fn register_req(email: &str, password: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            name: "Siti Rahma".into(),
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("teacher@school.test"));
        assert!(!is_valid_email("teacher@school"));
        assert!(!is_valid_email("not an email"));
    }

    #[tokio::test]
    async fn register_then_login_with_same_credentials() {
        let store = MemoryStore::default();
        let keys = keys();

        let registered = register_identity(&store, &keys, register_req("Siti@School.test ", "hunter22", None))
            .await
            .expect("register");
        assert_eq!(registered.user.email, "siti@school.test");
        assert_eq!(registered.user.role, Role::User);
        assert!(registered.user.is_active);
        assert_eq!(keys.verify(&registered.token).unwrap().sub, registered.user.id);
        assert!(keys.verify(&registered.refresh_token).is_ok());

        let logged_in = login(
            &store,
            &keys,
            LoginRequest {
                email: "siti@school.test".into(),
                password: "hunter22".into(),
            },
        )
        .await
        .expect("login");
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let store = MemoryStore::default();
        let keys = keys();
        register_identity(&store, &keys, register_req("a@school.test", "right-pass", None))
            .await
            .unwrap();

        let err = login(
            &store,
            &keys,
            LoginRequest {
                email: "a@school.test".into(),
                password: "wrong-pass".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_unauthorized() {
        let store = MemoryStore::default();
        let err = login(
            &store,
            &keys(),
            LoginRequest {
                email: "ghost@school.test".into(),
                password: "whatever".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict_case_insensitively() {
        let store = MemoryStore::default();
        let keys = keys();
        register_identity(&store, &keys, register_req("dup@school.test", "secret1", None))
            .await
            .unwrap();
        let err = register_identity(&store, &keys, register_req("DUP@School.Test", "secret2", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let store = MemoryStore::default();
        let keys = keys();
        let short = register_identity(&store, &keys, register_req("p@school.test", "12345", None))
            .await
            .unwrap_err();
        assert!(matches!(short, AppError::BadRequest(_)));

        let bad_email = register_identity(&store, &keys, register_req("nope", "123456", None))
            .await
            .unwrap_err();
        assert!(matches!(bad_email, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn register_keeps_requested_role() {
        let store = MemoryStore::default();
        let keys = keys();
        let resp = register_identity(&store, &keys, register_req("boss@school.test", "secret1", Some(Role::Admin)))
            .await
            .unwrap();
        assert_eq!(resp.user.role, Role::Admin);
        assert_eq!(keys.verify(&resp.token).unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn refresh_issues_access_token_for_active_user() {
        let store = MemoryStore::default();
        let keys = keys();
        let registered = register_identity(&store, &keys, register_req("r@school.test", "secret1", None))
            .await
            .unwrap();

        let refreshed = refresh(&store, &keys, &registered.refresh_token).await.unwrap();
        let claims = keys.verify(&refreshed.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);
        assert_eq!(claims.email, "r@school.test");
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_and_deactivated_users() {
        let store = MemoryStore::default();
        let keys = keys();
        let err = refresh(&store, &keys, "garbage").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let registered = register_identity(&store, &keys, register_req("gone@school.test", "secret1", None))
            .await
            .unwrap();
        store.deactivate_user(registered.user.id);
        let err = refresh(&store, &keys, &registered.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = profile(&store, registered.user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
