//! Credential, session and caregiver-relationship core for CareWatch.
//!
//! The [`AuthService`] ties together four components:
//!
//! * [`CredentialStore`] registers users and verifies passwords
//! * [`SessionManager`] issues and validates opaque bearer tokens
//! * [`RelationshipRegistry`] tracks caregiver access requests to seniors
//! * [`AccessGuard`] decides whether a session may touch a patient's data
//!
//! Every component talks to storage through the traits in [`repositories`],
//! backed either by PostgreSQL or by the in-memory [`MemoryStore`].

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod relationships;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod session;
pub mod state;
pub mod sweeper;
pub mod token;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use credentials::CredentialStore;
pub use error::{AuthError, AuthResult};
pub use guard::{AccessGuard, Caller};
pub use relationships::RelationshipRegistry;
pub use repositories::MemoryStore;
pub use service::{AuthService, LoginOutput};
pub use session::SessionManager;
pub use state::AppState;
