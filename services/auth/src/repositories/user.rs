//! User repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, Role, User};

pub(crate) const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, created_at, updated_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> AuthResult<User> {
    let role: String = row.try_get("role")?;
    let role: Role = role
        .parse()
        .map_err(|_| AuthError::Internal(format!("unknown role in store: {}", role)))?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        role,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, new_user: NewUser) -> AuthResult<User> {
        info!("Creating new {} user {}", new_user.role, new_user.id);

        let sql = format!(
            "INSERT INTO users (id, email, password_hash, full_name, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(new_user.id)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .bind(new_user.role.as_str())
            .bind(new_user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AuthError::DuplicateEmail
                }
                other => other.into(),
            })?;

        user_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }
}
