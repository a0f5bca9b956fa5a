use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    db::{PgStore, StoreResult},
};

/// Unique constraint on `users.email`.
pub const USERS_EMAIL_KEY: &str = "users_email_key";

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Single constrained insert; a taken email surfaces as a unique violation of
    /// [`USERS_EMAIL_KEY`].
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_active_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, role, is_active, created_at, updated_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(new.role)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, role, is_active, created_at, updated_at
            FROM users
            WHERE email = $1 AND is_active
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn find_active_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, role, is_active, created_at, updated_at
            FROM users
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, role, is_active, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }
}
