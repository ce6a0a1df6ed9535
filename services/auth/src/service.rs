//! Authentication service: wires the core components together
//!
//! Login, logout and password changes span more than one component, so
//! they are orchestrated here rather than in the route handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::credentials::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::guard::AccessGuard;
use crate::models::{ClientMeta, LoginCredentials, RegisterUser, User, normalize_email};
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::relationships::RelationshipRegistry;
use crate::repositories::{
    MemoryStore, PgRelationshipRepository, PgSessionRepository, PgUserRepository,
    RelationshipRepository, SessionRepository, UserRepository,
};
use crate::session::SessionManager;

/// Successful login result
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutput {
    /// Opaque bearer token; shown once
    pub token: String,
    pub token_type: &'static str,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    sessions: SessionManager,
    relationships: RelationshipRegistry,
    guard: AccessGuard,
    rate_limiter: RateLimiter,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        let credentials = CredentialStore::new(users.clone(), clock.clone());
        let sessions = SessionManager::new(sessions, clock.clone(), config.session_ttl());
        let relationships = RelationshipRegistry::new(relationships, users.clone(), clock.clone());
        let guard = AccessGuard::new(sessions.clone(), users, relationships.clone());
        let rate_limiter = RateLimiter::new(RateLimiterConfig::from(config), clock);

        Self {
            credentials,
            sessions,
            relationships,
            guard,
            rate_limiter,
        }
    }

    /// Service backed by PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool, config: &AuthConfig) -> Self {
        Self::new(
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgSessionRepository::new(pool.clone())),
            Arc::new(PgRelationshipRepository::new(pool)),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Service backed by an in-memory store.
    pub fn in_memory(store: MemoryStore, clock: Arc<dyn Clock>, config: &AuthConfig) -> Self {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            clock,
            config,
        )
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn relationships(&self) -> &RelationshipRegistry {
        &self.relationships
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub async fn register(&self, input: RegisterUser) -> AuthResult<User> {
        self.credentials.register(input).await
    }

    /// Authenticate and open a session.
    pub async fn login(&self, credentials: LoginCredentials, meta: ClientMeta) -> AuthResult<LoginOutput> {
        let key = normalize_email(&credentials.email);
        self.rate_limiter.try_acquire(&key).await?;

        let user = self
            .credentials
            .authenticate(&credentials.email, &credentials.password)
            .await?;
        self.rate_limiter.reset(&key).await;

        let issued = self.sessions.create_session(user.id, meta).await?;
        info!("User {} logged in with session {}", user.id, issued.session.id);

        Ok(LoginOutput {
            token: issued.token,
            token_type: "Bearer",
            session_id: issued.session.id,
            expires_at: issued.session.expires_at,
            user,
        })
    }

    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        self.sessions.revoke(token).await
    }

    /// Resolve a bearer token to the full user record.
    pub async fn validate_session(&self, token: &str) -> AuthResult<User> {
        let user_id = self.sessions.validate(token).await?;
        self.credentials
            .find_user(user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)
    }

    /// Change the password and revoke every session of the user,
    /// the current one included. Returns the number of revoked sessions.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<u64> {
        self.credentials
            .change_password(user_id, current_password, new_password)
            .await?;
        self.sessions.revoke_all_for_user(user_id).await
    }
}
