//! Error taxonomy for the access-control core

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::models::RelationshipStatus;

/// Message shown for every denial so callers cannot probe which
/// sessions or resources exist.
pub const GENERIC_DENIAL: &str = "Access denied";

/// Errors raised by the credential store, session manager,
/// relationship registry and access guard.
///
/// Every variant is terminal for the request that triggered it.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("an access request already exists for this caregiver and patient")]
    RequestAlreadyExists,

    #[error("a user cannot request access to their own records")]
    SelfRequest,

    #[error("request must go from a caregiver to a senior")]
    InvalidRoles,

    #[error("not found")]
    NotFound,

    #[error("relationship is {0}, transition not allowed")]
    InvalidTransition(RelationshipStatus),

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("too many attempts, try again later")]
    RateLimited,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Errors that surface to end users as the same generic denial.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthError::Forbidden | AuthError::SessionExpired | AuthError::SessionNotFound
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::DuplicateEmail
            | AuthError::RequestAlreadyExists
            | AuthError::InvalidTransition(_)
            | AuthError::ConstraintViolation(_) => StatusCode::CONFLICT,
            AuthError::InvalidRole(_)
            | AuthError::InvalidRoles
            | AuthError::SelfRequest
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => AuthError::ConstraintViolation(db.message().to_string()),
                // missing tables, deadlocks, serialization failures
                _ => AuthError::StorageUnavailable(db.message().to_string()),
            },
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => AuthError::Internal(err.to_string()),
            _ => AuthError::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Configuration(msg) => AuthError::Internal(msg),
            other => AuthError::StorageUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            e if e.is_denial() => GENERIC_DENIAL.to_string(),
            AuthError::StorageUnavailable(_) => "Service temporarily unavailable".to_string(),
            AuthError::ConstraintViolation(_) => "Request conflicts with stored data".to_string(),
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for results of the access-control core
pub type AuthResult<T> = Result<T, AuthError>;
