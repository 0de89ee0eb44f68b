//! Admin key middleware.
//!
//! Guards the dashboard API with a shared key sent in `X-Admin-Key`.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::trace_id::get_request_id;

/// Header carrying the admin key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Middleware that requires the configured admin key.
///
/// An empty configured key disables the check.
pub async fn require_admin_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.security.admin_key.as_str();
    if expected.is_empty() {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if keys_match(key, expected) => next.run(req).await,
        Some(_) => {
            tracing::warn!(
                request_id = %get_request_id(req.extensions()),
                path = %req.uri().path(),
                "Rejected request with invalid admin key"
            );
            ApiError::Unauthorized("Invalid admin key".to_string()).into_response()
        }
        None => ApiError::Unauthorized("Missing admin key".to_string()).into_response(),
    }
}

/// Compares keys without short-circuiting on the first differing byte.
fn keys_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
