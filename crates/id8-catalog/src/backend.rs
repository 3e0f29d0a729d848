//! Catalog backend trait and factory.
//!
//! This module defines the `CatalogBackend` trait that every catalog source
//! must satisfy.
//!
//! # Backends
//!
//! - `MemoryCatalog`: in-process table, seedable from a JSON file
//! - `RestCatalog`: the managed database over its REST interface
//! - `UnconfiguredCatalog`: stands in when database credentials are missing
//!
//! # Example
//!
//! ```rust,ignore
//! use id8_catalog::{create_catalog_backend, ListFilters, PageRequest};
//!
//! let backend = create_catalog_backend(&config.catalog).await?;
//! let page = backend.list(&ListFilters::default(), PageRequest::default()).await?;
//! println!("{} items", page.total);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use id8_core::config::CatalogConfig;
use id8_core::{CatalogItem, Error, Result};

use crate::memory::MemoryCatalog;
use crate::rest::RestCatalog;
use crate::types::{InstallEvent, ListFilters, Page, PageRequest, ViewEvent};

/// Abstract catalog source.
///
/// Reads return denormalized `CatalogItem` records. The two `record_*`
/// methods are the only writes and only touch counters and event logs.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Search published items by name/description, best match first.
    ///
    /// `limit` is already clamped by the caller.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>>;

    /// Filtered, paginated listing.
    async fn list(&self, filters: &ListFilters, page: PageRequest) -> Result<Page<CatalogItem>>;

    /// Look up one item by slug, regardless of status.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<CatalogItem>>;

    /// Increment the view counter and log session metadata.
    async fn record_view(&self, event: &ViewEvent) -> Result<()>;

    /// Increment the install counter and log install metadata.
    async fn record_install(&self, event: &InstallEvent) -> Result<()>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Whether the backend can serve requests.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Create a catalog backend based on configuration.
///
/// Selection logic:
/// 1. `"rest"` with URL and API key → `RestCatalog`
/// 2. `"rest"` with missing credentials → `UnconfiguredCatalog` (every call
///    fails with a configuration error instead of panicking at startup)
/// 3. `"memory"` → `MemoryCatalog`, seeded from `seed_path` when set
///
/// # Errors
///
/// Returns an error for an unknown backend name, an unreadable seed file, or
/// an HTTP client that cannot be built.
pub async fn create_catalog_backend(config: &CatalogConfig) -> Result<Arc<dyn CatalogBackend>> {
    match config.backend.as_str() {
        "rest" => {
            let url = config.url.as_deref().filter(|u| !u.is_empty());
            let key = config.api_key.as_deref().filter(|k| !k.is_empty());
            match (url, key) {
                (Some(_), Some(_)) => Ok(Arc::new(RestCatalog::from_config(config)?)),
                _ => {
                    log::warn!(
                        "Catalog backend 'rest' selected but catalog.url/catalog.api_key are not set"
                    );
                    Ok(Arc::new(UnconfiguredCatalog::new(
                        "catalog database credentials are not configured",
                    )))
                }
            }
        }
        "memory" => {
            let catalog = match &config.seed_path {
                Some(path) => MemoryCatalog::from_json_file(path).await?,
                None => MemoryCatalog::new(),
            };
            Ok(Arc::new(
                catalog.with_event_log_capacity(config.event_log_capacity),
            ))
        }
        other => Err(Error::config(format!(
            "unknown catalog backend '{other}' (expected 'memory' or 'rest')"
        ))),
    }
}

/// Backend used when the managed database cannot be reached for lack of
/// credentials. Every operation fails with [`Error::Config`].
#[derive(Debug, Clone)]
pub struct UnconfiguredCatalog {
    reason: String,
}

impl UnconfiguredCatalog {
    /// Create a placeholder that reports `reason` on every call.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(Error::config(self.reason.clone()))
    }
}

#[async_trait]
impl CatalogBackend for UnconfiguredCatalog {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<CatalogItem>> {
        self.fail()
    }

    async fn list(&self, _filters: &ListFilters, _page: PageRequest) -> Result<Page<CatalogItem>> {
        self.fail()
    }

    async fn get_by_slug(&self, _slug: &str) -> Result<Option<CatalogItem>> {
        self.fail()
    }

    async fn record_view(&self, _event: &ViewEvent) -> Result<()> {
        self.fail()
    }

    async fn record_install(&self, _event: &InstallEvent) -> Result<()> {
        self.fail()
    }

    fn name(&self) -> &str {
        "unconfigured"
    }

    fn is_ready(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
