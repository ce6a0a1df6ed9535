//! Application state shared across handlers

use sqlx::PgPool;

use auth::AccessGuard;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub guard: AccessGuard,
    /// Absent when running on the in-memory store
    pub db_pool: Option<PgPool>,
}
