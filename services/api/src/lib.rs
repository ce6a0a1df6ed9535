//! Patient monitoring API.
//!
//! Every patient-scoped route asks the [`auth::AccessGuard`] before any
//! reading is produced.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod vitals;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
