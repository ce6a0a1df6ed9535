//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use auth::AuthError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Session or authorization failure from the access guard
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // keeps the generic denial body for session and access errors
            ApiError::Auth(err) => err.into_response(),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_keeps_generic_denial() {
        let response = ApiError::from(AuthError::Forbidden).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bad_request_maps_to_400() {
        let response = ApiError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
