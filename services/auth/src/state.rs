//! Application state shared across handlers

use sqlx::PgPool;

use crate::service::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub service: AuthService,
    /// Absent when running on the in-memory store
    pub db_pool: Option<PgPool>,
}
