//! Admin catalog views behind bearer-token auth.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use id8_auth::{AdminTokenValidator, AuthConfig, AuthLayer, AuthenticatedAdmin};
use id8_catalog::Page;
use id8_core::{CatalogItem, Error};

use super::ListParams;
use crate::error::Result;
use crate::state::AppState;

/// Admin routes, wrapped in the auth layer.
pub fn router(auth: AuthConfig) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/items", get(list_all))
        .route("/api/admin/items/{slug}", get(detail_any))
        .route_layer(AuthLayer::new(Arc::new(AdminTokenValidator), auth))
}

async fn list_all(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthenticatedAdmin>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<CatalogItem>>> {
    let (filters, page) = params.parse(true)?;
    tracing::debug!(admin = %admin.subject, status = %filters.status, "admin listing");
    Ok(Json(state.catalog.list(&filters, page).await?))
}

async fn detail_any(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogItem>> {
    state
        .catalog
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("item", slug).into())
}
