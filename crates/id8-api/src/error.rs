//! Error types for id8-api.
//!
//! [`ApiError`] is what handlers return; its `IntoResponse` impl is the one
//! place domain errors become HTTP statuses.

use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use id8_ratelimit::RateLimitDecision;
use serde_json::json;
use thiserror::Error;

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors a handler can return.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// Error from id8-core (validation, lookup, upstream, config).
    #[error(transparent)]
    Core(#[from] id8_core::Error),

    /// The caller exhausted its window.
    #[error("Too many requests")]
    RateLimited(RateLimitDecision),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Core(err) => match err {
                id8_core::Error::Validation { .. } => StatusCode::BAD_REQUEST,
                id8_core::Error::NotFound { .. } => StatusCode::NOT_FOUND,
                id8_core::Error::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
                id8_core::Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show a caller.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::SERVICE_UNAVAILABLE => "Service not configured".to_string(),
            StatusCode::BAD_GATEWAY => "Upstream service error".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        let mut response = (status, Json(json!({ "error": self.public_message() }))).into_response();
        if let ApiError::RateLimited(decision) = &self {
            let headers = response.headers_mut();
            insert_rate_limit_headers(headers, decision);
            headers.insert(
                HeaderName::from_static("retry-after"),
                HeaderValue::from(decision.retry_after_secs()),
            );
        }
        response
    }
}

/// Add `X-RateLimit-Limit`, `-Remaining` and `-Reset` (unix seconds).
pub fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(decision.reset_at().timestamp()),
    );
}
