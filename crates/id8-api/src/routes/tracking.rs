//! View and install tracking.
//!
//! Both endpoints follow the same sequence:
//!
//! 1. Parse and validate the body (`400` on failure, nothing recorded)
//! 2. Check the per-client window (`429` with rate-limit headers)
//! 3. Record the event; backend failures are logged and the call still
//!    succeeds

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use id8_catalog::{InstallEvent, ViewEvent};
use id8_core::{Error, valid_item_id};
use id8_ratelimit::{RateLimitDecision, RateLimiter};
use serde::Deserialize;
use serde_json::json;

use crate::client::ClientKey;
use crate::error::{ApiError, Result, insert_rate_limit_headers};
use crate::state::AppState;

/// Tracking routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/track/view", post(track_view))
        .route("/api/track/install", post(track_install))
}

/// Body accepted by both tracking endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackRequest {
    /// Item being tracked; required.
    #[serde(default)]
    pub item_id: Option<String>,
    /// Install method ("copy", "cli", "download").
    #[serde(default)]
    pub method: Option<String>,
    /// Client platform.
    #[serde(default)]
    pub platform: Option<String>,
    /// Anonymous session id for views.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Referrer for views.
    #[serde(default)]
    pub referrer: Option<String>,
}

impl TrackRequest {
    /// Parse a raw body. Content type is not checked; the body must be JSON.
    pub fn parse(body: &[u8]) -> std::result::Result<Self, Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| Error::validation(format!("invalid request body: {e}")))
    }

    /// The validated item id.
    pub fn item_id(&self) -> std::result::Result<String, Error> {
        self.item_id
            .as_deref()
            .and_then(valid_item_id)
            .map(str::to_string)
            .ok_or_else(|| Error::validation_field("itemId", "itemId is required"))
    }
}

/// Trim, and drop empty strings.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn admit(limiter: &RateLimiter, client: &ClientKey) -> Result<RateLimitDecision> {
    let decision = limiter.check(client.as_str());
    if decision.allowed {
        Ok(decision)
    } else {
        tracing::info!(
            limiter = limiter.name(),
            client = client.as_str(),
            "rate limit exceeded"
        );
        Err(ApiError::RateLimited(decision))
    }
}

fn success(decision: &RateLimitDecision) -> Response {
    let mut response = Json(json!({ "success": true })).into_response();
    insert_rate_limit_headers(response.headers_mut(), decision);
    response
}

async fn track_view(
    State(state): State<Arc<AppState>>,
    client: ClientKey,
    body: Bytes,
) -> Result<Response> {
    let request = TrackRequest::parse(&body)?;
    let item_id = request.item_id()?;
    let decision = admit(&state.view_limiter, &client)?;

    let event = ViewEvent {
        item_id,
        session_id: optional(request.session_id),
        referrer: optional(request.referrer),
    };
    if let Err(e) = state.catalog.record_view(&event).await {
        tracing::warn!(item_id = %event.item_id, error = %e, "failed to record view");
    }
    Ok(success(&decision))
}

async fn track_install(
    State(state): State<Arc<AppState>>,
    client: ClientKey,
    body: Bytes,
) -> Result<Response> {
    let request = TrackRequest::parse(&body)?;
    let item_id = request.item_id()?;
    let decision = admit(&state.install_limiter, &client)?;

    let event = InstallEvent {
        item_id,
        method: optional(request.method)
            .unwrap_or_else(|| InstallEvent::UNKNOWN_METHOD.to_string()),
        platform: optional(request.platform),
    };
    if let Err(e) = state.catalog.record_install(&event).await {
        tracing::warn!(item_id = %event.item_id, error = %e, "failed to record install");
    }
    Ok(success(&decision))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_body() {
        let req = TrackRequest::parse(br#"{"itemId":" a1 ","method":"cli"}"#).unwrap();
        assert_eq!(req.item_id().unwrap(), "a1");
        assert_eq!(req.method.as_deref(), Some("cli"));
    }

    #[test]
    fn test_missing_or_blank_item_id() {
        let empty = TrackRequest::parse(b"").unwrap();
        assert!(empty.item_id().is_err());

        let blank = TrackRequest::parse(br#"{"itemId":"   "}"#).unwrap();
        assert!(matches!(
            blank.item_id(),
            Err(Error::Validation { field: Some(f), .. }) if f == "itemId"
        ));
    }

    #[test]
    fn test_unknown_fields_and_bad_json_rejected() {
        assert!(TrackRequest::parse(br#"{"itemId":"a","extra":1}"#).is_err());
        assert!(TrackRequest::parse(b"itemId=a").is_err());
    }

    #[test]
    fn test_optional_trims() {
        assert_eq!(optional(Some("  ".to_string())), None);
        assert_eq!(optional(Some(" x ".to_string())), Some("x".to_string()));
    }
}
