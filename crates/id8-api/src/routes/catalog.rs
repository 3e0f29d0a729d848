//! Public catalog queries.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use id8_catalog::{Page, clamp_search_limit};
use id8_core::{CatalogItem, Error};
use serde::{Deserialize, Serialize};

use super::{ListParams, parse_number};
use crate::error::Result;
use crate::state::AppState;

/// Catalog routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/catalog/search", get(search))
        .route("/api/catalog/items", get(list))
        .route("/api/catalog/items/{slug}", get(detail))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
}

/// Search response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked matches.
    pub items: Vec<CatalogItem>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let limit = clamp_search_limit(parse_number("limit", params.limit.as_deref())?);
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Ok(Json(SearchResponse { items: Vec::new() }));
    }
    let items = state.catalog.search(query, limit).await?;
    tracing::debug!(query, limit, hits = items.len(), "catalog search");
    Ok(Json(SearchResponse { items }))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<CatalogItem>>> {
    let (filters, page) = params.parse(false)?;
    Ok(Json(state.catalog.list(&filters, page).await?))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogItem>> {
    match state.catalog.get_by_slug(&slug).await? {
        Some(item) if item.is_published() => Ok(Json(item)),
        _ => Err(Error::not_found("item", slug).into()),
    }
}
