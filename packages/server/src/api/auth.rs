//! Token authentication middleware
//!
//! Accepts `Authorization: Token <key>` or `Authorization: Bearer <key>`.
//! Requests without a configured key are rejected with 401 before reaching
//! any handler.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::{AppState, HttpError};

const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Extract the key from an `Authorization` header value
pub fn parse_authorization(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();
    if key.is_empty() || !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return None;
    }
    Some(key)
}

pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HttpError::unauthorized("Authentication credentials were not provided"))?;

    match parse_authorization(header) {
        Some(key) if state.tokens.contains(key) => Ok(next.run(request).await),
        _ => {
            tracing::debug!(path = %request.uri().path(), "rejected invalid token");
            Err(HttpError::unauthorized("Invalid token"))
        }
    }
}
