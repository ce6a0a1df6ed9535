//! Session repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::SessionRepository;
use crate::error::AuthResult;
use crate::models::{NewSession, Session};

const SESSION_COLUMNS: &str =
    "id, user_id, token_hash, created_at, expires_at, last_activity, ip_address, user_agent";

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> AuthResult<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        token_hash: row.try_get("token_hash")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        last_activity: row.try_get("last_activity")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
    })
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert(&self, new_session: NewSession) -> AuthResult<Session> {
        let sql = format!(
            "INSERT INTO sessions \
             (id, user_id, token_hash, created_at, expires_at, last_activity, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $4, $6, $7) \
             RETURNING {}",
            SESSION_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(new_session.id)
            .bind(new_session.user_id)
            .bind(&new_session.token_hash)
            .bind(new_session.created_at)
            .bind(new_session.expires_at)
            .bind(&new_session.ip_address)
            .bind(&new_session.user_agent)
            .fetch_one(&self.pool)
            .await?;

        session_from_row(&row)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AuthResult<Option<Session>> {
        let sql = format!("SELECT {} FROM sessions WHERE token_hash = $1", SESSION_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE sessions SET last_activity = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AuthResult<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 ORDER BY created_at DESC, id",
            SESSION_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(session_from_row).collect()
    }
}
