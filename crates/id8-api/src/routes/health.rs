//! Liveness and catalog readiness.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Health response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the catalog cannot serve requests.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Crate version.
    pub version: String,
    /// Catalog backend name.
    pub catalog: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.catalog.is_ready() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status: status.to_string(),
        service: "id8-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog: state.catalog.name().to_string(),
    })
}
