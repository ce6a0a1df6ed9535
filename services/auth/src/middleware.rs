//! Middleware for bearer session validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{error::AuthError, state::AppState};

/// Raw bearer token of the current request.
///
/// Deliberately not `Debug` so it cannot end up in log output.
#[derive(Clone)]
pub struct SessionToken(pub String);

/// Validate the bearer token and expose the caller to handlers.
///
/// On success the request carries a [`crate::guard::Caller`] and a
/// [`SessionToken`] extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::SessionNotFound)?;
    let token = bearer.token().to_string();

    let caller = state.service.guard().identify(&token).await?;

    req.extensions_mut().insert(caller);
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}
