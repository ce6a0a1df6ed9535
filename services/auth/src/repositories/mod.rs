//! Storage seams for users, sessions and relationships
//!
//! Every trait has a PostgreSQL implementation used by the services and an
//! in-memory one ([`MemoryStore`]) used by tests and local demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AuthResult;
use crate::models::{
    AccessRequest, NewSession, NewUser, Relationship, RelationshipStatus, Session, User,
};

pub mod memory;
pub mod relationship;
pub mod session;
pub mod user;

pub use memory::MemoryStore;
pub use relationship::PgRelationshipRepository;
pub use session::PgSessionRepository;
pub use user::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail` when the email is taken.
    async fn insert(&self, new_user: NewUser) -> AuthResult<User>;

    /// Lookup by an already normalized email.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Fails with `NotFound` when the user does not exist.
    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, new_session: NewSession) -> AuthResult<Session>;

    async fn find_by_token_hash(&self, token_hash: &str) -> AuthResult<Option<Session>>;

    /// Refreshes `last_activity`. A missing row is not an error.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()>;

    async fn delete(&self, id: Uuid) -> AuthResult<()>;

    /// Returns whether a row was removed.
    async fn delete_by_token_hash(&self, token_hash: &str) -> AuthResult<bool>;

    async fn delete_for_user(&self, user_id: Uuid) -> AuthResult<u64>;

    /// Removes every session with `expires_at < now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> AuthResult<Vec<Session>>;
}

#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// Atomically opens a request for the pair.
    ///
    /// Inserts a `pending` row when the pair is unknown, reopens a
    /// `rejected` or `removed` row in place (same id), and fails with
    /// `RequestAlreadyExists` when the row is `pending` or `approved`.
    async fn open_request(&self, request: AccessRequest) -> AuthResult<Relationship>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Relationship>>;

    async fn find_by_pair(
        &self,
        caregiver_id: Uuid,
        patient_id: Uuid,
    ) -> AuthResult<Option<Relationship>>;

    /// Compare-and-set on the status column.
    ///
    /// Returns `None` when the row is missing or no longer in `expected`.
    /// `responded_at` is left untouched when `None` is passed.
    async fn update_status(
        &self,
        id: Uuid,
        expected: RelationshipStatus,
        next: RelationshipStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Option<Relationship>>;

    /// Patients with an `approved` relationship, oldest request first.
    async fn approved_patients(&self, caregiver_id: Uuid) -> AuthResult<Vec<User>>;

    /// Relationships of the patient in `status`, oldest request first.
    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: RelationshipStatus,
    ) -> AuthResult<Vec<Relationship>>;
}
