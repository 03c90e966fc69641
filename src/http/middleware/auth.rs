//! Bearer token guard.
//! Attaches a [`Principal`] to authenticated requests.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthService, Principal, TokenError};
use crate::http::error::ApiError;

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn auth_middleware(
    State(auth): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthenticated("Access token required"))?;

    let principal: Principal = auth.verify_bearer(token).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        match e {
            TokenError::Expired => ApiError::unauthenticated("Token expired"),
            _ => ApiError::unauthenticated("Invalid token"),
        }
    })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
