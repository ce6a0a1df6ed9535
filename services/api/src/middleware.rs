//! Bearer token extraction for patient routes
//!
//! The token itself is checked by the access guard in each handler, since
//! the decision depends on the patient in the path.

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use auth::{AuthError, middleware::SessionToken};

use crate::error::ApiError;

/// Require a bearer token and expose it as a [`SessionToken`] extension.
pub async fn bearer_middleware(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::SessionNotFound)?;

    req.extensions_mut()
        .insert(SessionToken(bearer.token().to_string()));

    Ok(next.run(req).await)
}
