//! Managed-database backend over a PostgREST-style HTTP interface.
//!
//! Tables and procedures used:
//!
//! | Resource | Use |
//! |----------|-----|
//! | `catalog_items` | item reads (rows carry `item_type`) |
//! | `rpc/increment_view_count` | view counter |
//! | `rpc/increment_install_count` | install counter |
//! | `item_views` | view metadata log |
//! | `item_installs` | install metadata log |
//!
//! Counts come from a `HEAD` request with `Prefer: count=exact`, issued in
//! parallel with the row query; the total is read from `Content-Range`.
//!
//! Search issues one query per match tier (exact name, name prefix, name
//! substring, name or description), each ordered by popularity and capped at
//! the requested limit, then ranks the merged rows locally.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use id8_core::config::CatalogConfig;
use id8_core::{CatalogItem, Error, ItemKind, ItemStatus, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;

use crate::backend::CatalogBackend;
use crate::rank::rank_items;
use crate::types::{InstallEvent, ListFilters, Page, PageRequest, StatusFilter, ViewEvent};

const SERVICE: &str = "catalog-db";
const ITEMS_TABLE: &str = "catalog_items";
const LISTING_ORDER: &str = "featured.desc,install_count.desc,name.asc";
const POPULARITY_ORDER: &str = "install_count.desc,view_count.desc,name.asc";

/// Catalog backed by the managed database.
#[derive(Debug, Clone)]
pub struct RestCatalog {
    client: Client,
    base_url: String,
}

impl RestCatalog {
    /// Build a client for `url` authenticating with `api_key`.
    pub fn new(
        url: &str,
        api_key: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| Error::config("catalog.api_key contains invalid characters"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::config("catalog.api_key contains invalid characters"))?;
        headers.insert("apikey", key);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build catalog HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
        })
    }

    /// Build from the `[catalog]` config section.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::config("catalog.url is not set"))?;
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("catalog.api_key is not set"))?;
        Self::new(
            url,
            key,
            Duration::from_secs(config.request_timeout_secs.max(1)),
            Duration::from_secs(config.connect_timeout_secs.max(1)),
        )
    }

    fn url(&self, resource: &str, params: &[(String, String)]) -> Result<Url> {
        let raw = format!("{}/{resource}", self.base_url);
        Url::parse_with_params(&raw, params)
            .map_err(|e| Error::config(format!("invalid catalog URL '{raw}': {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(Error::upstream_status(SERVICE, status.as_u16(), snippet))
    }

    async fn fetch_rows(&self, params: &[(String, String)]) -> Result<Vec<CatalogItem>> {
        let url = self.url(ITEMS_TABLE, params)?;
        let rows: Vec<ItemRow> = self
            .send(self.client.get(url))
            .await?
            .json()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("malformed item rows: {e}")))?;
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn count_rows(&self, params: &[(String, String)]) -> Result<usize> {
        let url = self.url(ITEMS_TABLE, params)?;
        let response = self
            .send(
                self.client
                    .request(Method::HEAD, url)
                    .header("Prefer", "count=exact"),
            )
            .await?;
        let range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::upstream(SERVICE, "count response had no Content-Range"))?;
        parse_content_range_total(range)
            .ok_or_else(|| Error::upstream(SERVICE, format!("unparseable Content-Range '{range}'")))
    }

    async fn rpc(&self, procedure: &str, item_id: &str) -> Result<()> {
        let url = self.url(&format!("rpc/{procedure}"), &[])?;
        self.send(self.client.post(url).json(&json!({ "item_id": item_id })))
            .await?;
        Ok(())
    }

    /// Top `limit` published rows matching one tier's filter.
    async fn search_tier(
        &self,
        filter: (String, String),
        limit: usize,
    ) -> Result<Vec<CatalogItem>> {
        let params = vec![
            param("select", "*"),
            param("status", "eq.published"),
            filter,
            param("order", POPULARITY_ORDER),
            param("limit", limit.to_string()),
        ];
        self.fetch_rows(&params).await
    }

    async fn insert(&self, table: &str, row: serde_json::Value) -> Result<()> {
        let url = self.url(table, &[])?;
        self.send(
            self.client
                .post(url)
                .header("Prefer", "return=minimal")
                .json(&row),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for RestCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        let pattern = sanitize_pattern(query);
        if pattern.is_empty() {
            return Ok(Vec::new());
        }
        let (exact, prefix, contains, any) = tokio::try_join!(
            self.search_tier(param("name", format!("ilike.{pattern}")), limit),
            self.search_tier(param("name", format!("ilike.{pattern}*")), limit),
            self.search_tier(param("name", format!("ilike.*{pattern}*")), limit),
            self.search_tier(text_filter(&pattern), limit),
        )?;

        let mut seen = HashSet::new();
        let candidates: Vec<CatalogItem> = exact
            .into_iter()
            .chain(prefix)
            .chain(contains)
            .chain(any)
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        log::debug!(
            "RestCatalog: search query='{query}', pattern='{pattern}', candidates={}",
            candidates.len()
        );
        Ok(rank_items(candidates, &pattern, limit))
    }

    async fn list(&self, filters: &ListFilters, page: PageRequest) -> Result<Page<CatalogItem>> {
        let filter_params = filter_params(filters);

        let mut row_params = vec![param("select", "*")];
        row_params.extend(filter_params.iter().cloned());
        row_params.push(param("order", LISTING_ORDER));
        row_params.push(param("offset", page.offset().to_string()));
        row_params.push(param("limit", page.limit.to_string()));

        let mut count_params = vec![param("select", "id")];
        count_params.extend(filter_params);

        let (rows, total) = tokio::try_join!(
            self.fetch_rows(&row_params),
            self.count_rows(&count_params)
        )?;
        Ok(Page::new(rows, total, page))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CatalogItem>> {
        let params = vec![
            param("select", "*"),
            param("slug", format!("eq.{slug}")),
            param("limit", "1"),
        ];
        Ok(self.fetch_rows(&params).await?.into_iter().next())
    }

    async fn record_view(&self, event: &ViewEvent) -> Result<()> {
        self.rpc("increment_view_count", &event.item_id).await?;
        if event.has_metadata() {
            self.insert(
                "item_views",
                json!({
                    "item_id": event.item_id,
                    "session_id": event.session_id,
                    "referrer": event.referrer,
                }),
            )
            .await?;
        }
        Ok(())
    }

    async fn record_install(&self, event: &InstallEvent) -> Result<()> {
        self.rpc("increment_install_count", &event.item_id).await?;
        self.insert(
            "item_installs",
            json!({
                "item_id": event.item_id,
                "install_method": event.method,
                "platform": event.platform,
            }),
        )
        .await
    }

    fn name(&self) -> &str {
        "rest"
    }
}

// ============================================================================
// Row mapping
// ============================================================================

/// Row shape of `catalog_items`.
#[derive(Debug, Deserialize)]
struct ItemRow {
    id: String,
    slug: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    item_type: ItemKind,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    status: Option<ItemStatus>,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    install_count: Option<i64>,
    #[serde(default)]
    view_count: Option<i64>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for CatalogItem {
    fn from(row: ItemRow) -> Self {
        let counter = |v: Option<i64>| v.map(|n| n.max(0) as u64).unwrap_or(0);
        CatalogItem {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description.unwrap_or_default(),
            kind: row.item_type,
            category: row.category.unwrap_or_default(),
            tags: row.tags.unwrap_or_default().into_iter().collect::<BTreeSet<_>>(),
            status: row.status.unwrap_or_default(),
            verified: row.verified,
            featured: row.featured,
            install_count: counter(row.install_count),
            view_count: counter(row.view_count),
            author: row.author,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ============================================================================
// Query helpers
// ============================================================================

fn param(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

fn text_filter(pattern: &str) -> (String, String) {
    param(
        "or",
        format!("(name.ilike.*{pattern}*,description.ilike.*{pattern}*)"),
    )
}

fn filter_params(filters: &ListFilters) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if filters.status == StatusFilter::Published {
        params.push(param("status", "eq.published"));
    }
    if let Some(category) = filters.category_name() {
        params.push(param("category", format!("eq.{category}")));
    }
    if let Some(kind) = filters.kind {
        params.push(param("item_type", format!("eq.{kind}")));
    }
    if filters.featured_only {
        params.push(param("featured", "is.true"));
    }
    if let Some(q) = filters.search_text() {
        let pattern = sanitize_pattern(q);
        if !pattern.is_empty() {
            params.push(text_filter(&pattern));
        }
    }
    params
}

/// Strip characters that carry meaning inside a PostgREST `or=(...)` filter.
pub fn sanitize_pattern(query: &str) -> String {
    query
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Extract the total from a `Content-Range` value such as `0-19/137` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Option<usize> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

// ============================================================================
// Tests
// ============================================================================
