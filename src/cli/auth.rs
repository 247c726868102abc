//! API key guard for protected routes

use super::server::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Result of checking a request's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Key present and correct
    Allowed,
    /// No key on the request
    Missing,
    /// Key present but wrong
    Denied,
    /// The server has no key configured, so nothing is allowed
    NotConfigured,
}

impl AuthDecision {
    /// Status for a rejected request
    pub fn status(self) -> StatusCode {
        match self {
            Self::Allowed => StatusCode::OK,
            Self::Missing => StatusCode::UNAUTHORIZED,
            Self::Denied | Self::NotConfigured => StatusCode::FORBIDDEN,
        }
    }
}

/// Check request headers against the configured key.
///
/// The key is read from `X-API-Key`, or from `Authorization: Bearer <key>`.
pub fn authorize(headers: &HeaderMap, expected: Option<&str>) -> AuthDecision {
    let Some(expected) = expected.filter(|k| !k.is_empty()) else {
        return AuthDecision::NotConfigured;
    };

    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim);

    match presented {
        None | Some("") => AuthDecision::Missing,
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => {
            AuthDecision::Allowed
        }
        Some(_) => AuthDecision::Denied,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Rejection body for a failed check
pub fn rejection(decision: AuthDecision) -> Response {
    let message = match decision {
        AuthDecision::Missing => "Missing API key",
        AuthDecision::NotConfigured => "API key not configured on server",
        _ => "Invalid API key",
    };
    (
        decision.status(),
        Json(super::server::ApiResponse::<()>::error(message)),
    )
        .into_response()
}

/// Middleware admitting only requests with the configured key
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = authorize(request.headers(), state.settings.api_key.as_deref());
    match decision {
        AuthDecision::Allowed => next.run(request).await,
        _ => {
            warn!(path = %request.uri().path(), ?decision, "Rejected request");
            rejection(decision)
        }
    }
}
