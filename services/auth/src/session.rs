//! Session management backed by the session repository

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AuthError, AuthResult};
use crate::models::{ClientMeta, IssuedSession, NewSession, Session};
use crate::repositories::SessionRepository;
use crate::token::{generate_session_token, hash_session_token};

/// Session manager for issuing, validating and revoking bearer tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(sessions: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            sessions,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a new session for a user
    pub async fn create_session(&self, user_id: Uuid, meta: ClientMeta) -> AuthResult<IssuedSession> {
        let token = generate_session_token();
        let now = self.clock.now();

        let session = self
            .sessions
            .insert(NewSession {
                id: Uuid::new_v4(),
                user_id,
                token_hash: hash_session_token(&token),
                created_at: now,
                expires_at: now + self.ttl,
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
            })
            .await?;

        info!("Created session {} for user {}", session.id, user_id);
        Ok(IssuedSession { token, session })
    }

    /// Resolve a token to its user id, refreshing `last_activity`.
    ///
    /// An expired session is deleted when detected, so it can never
    /// validate again.
    pub async fn validate(&self, token: &str) -> AuthResult<Uuid> {
        let session = self
            .sessions
            .find_by_token_hash(&hash_session_token(token))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let now = self.clock.now();
        if session.is_expired_at(now) {
            info!("Session {} expired at {}", session.id, session.expires_at);
            self.sessions.delete(session.id).await?;
            return Err(AuthError::SessionExpired);
        }

        self.sessions.touch(session.id, now).await?;
        debug!("Session {} validated", session.id);

        Ok(session.user_id)
    }

    /// Delete a session. Revoking an unknown token is not an error.
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        let removed = self
            .sessions
            .delete_by_token_hash(&hash_session_token(token))
            .await?;

        if removed {
            info!("Session revoked");
        }
        Ok(())
    }

    /// Delete all sessions for a user (logout from all devices)
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> AuthResult<u64> {
        let removed = self.sessions.delete_for_user(user_id).await?;
        info!("Revoked {} sessions for user {}", removed, user_id);
        Ok(removed)
    }

    /// Sessions of a user that are still usable, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AuthResult<Vec<Session>> {
        let now = self.clock.now();
        let sessions = self.sessions.list_for_user(user_id).await?;
        Ok(sessions
            .into_iter()
            .filter(|s| !s.is_expired_at(now))
            .collect())
    }

    /// Cleanup expired sessions
    pub async fn sweep_expired(&self) -> AuthResult<u64> {
        let removed = self.sessions.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            info!("Swept {} expired sessions", removed);
        }
        Ok(removed)
    }
}
