//! Authentication service models

pub mod relationship;
pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use relationship::{AccessRequest, Decision, Relationship, RelationshipStatus};
pub use role::{Capability, Role};
pub use session::{ClientMeta, IssuedSession, NewSession, Session};
pub use user::{LoginCredentials, NewUser, RegisterUser, User, UserSummary, normalize_email};
