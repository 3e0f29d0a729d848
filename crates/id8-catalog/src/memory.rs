//! In-process catalog backend.
//!
//! Holds the whole catalog in memory. Used for local development, demos,
//! and tests; counters and event logs are lost on restart. Event logs keep
//! only the most recent entries.

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use id8_core::{CatalogItem, Error, Result};
use tokio::sync::RwLock;

use crate::backend::CatalogBackend;
use crate::rank::{listing_order, matches_text, rank_items};
use crate::types::{InstallEvent, ListFilters, Page, PageRequest, StatusFilter, ViewEvent};

/// Default number of events kept per log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1_000;

/// In-memory catalog.
#[derive(Debug)]
pub struct MemoryCatalog {
    items: RwLock<Vec<CatalogItem>>,
    views: RwLock<VecDeque<ViewEvent>>,
    installs: RwLock<VecDeque<InstallEvent>>,
    log_capacity: usize,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self {
            items: RwLock::default(),
            views: RwLock::default(),
            installs: RwLock::default(),
            log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding `items`.
    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        Self {
            items: RwLock::new(items),
            ..Default::default()
        }
    }

    /// Keep at most `capacity` events in each log; older events are dropped.
    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Load items from a JSON array file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(e, path))?;
        let items: Vec<CatalogItem> = serde_json::from_str(&content)?;
        log::info!(
            "Seeded memory catalog with {} item(s) from {}",
            items.len(),
            path.display()
        );
        Ok(Self::with_items(items))
    }

    /// Add or replace an item (matched by id).
    pub async fn upsert(&self, item: CatalogItem) {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }

    /// Number of items held.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the catalog is empty.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Snapshot of an item by id.
    pub async fn get(&self, id: &str) -> Option<CatalogItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    /// Most recent view events, oldest first.
    pub async fn view_log(&self) -> Vec<ViewEvent> {
        self.views.read().await.iter().cloned().collect()
    }

    /// Most recent install events, oldest first.
    pub async fn install_log(&self) -> Vec<InstallEvent> {
        self.installs.read().await.iter().cloned().collect()
    }

    fn matches(item: &CatalogItem, filters: &ListFilters) -> bool {
        if filters.status == StatusFilter::Published && !item.is_published() {
            return false;
        }
        if let Some(category) = filters.category_name()
            && item.category != category
        {
            return false;
        }
        if let Some(kind) = filters.kind
            && item.kind != kind
        {
            return false;
        }
        if filters.featured_only && !item.featured {
            return false;
        }
        match filters.search_text() {
            Some(q) => matches_text(item, q),
            None => true,
        }
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogItem>> {
        let items = self.items.read().await;
        let published = items.iter().filter(|i| i.is_published()).cloned();
        let results = rank_items(published, query, limit);
        log::debug!(
            "MemoryCatalog: search query='{query}', limit={limit}, hits={}",
            results.len()
        );
        Ok(results)
    }

    async fn list(&self, filters: &ListFilters, page: PageRequest) -> Result<Page<CatalogItem>> {
        let items = self.items.read().await;
        let mut matching: Vec<CatalogItem> = items
            .iter()
            .filter(|i| Self::matches(i, filters))
            .cloned()
            .collect();
        drop(items);

        matching.sort_by(listing_order);
        let total = matching.len();
        let rows = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect();
        Ok(Page::new(rows, total, page))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CatalogItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .find(|i| i.slug == slug)
            .cloned())
    }

    async fn record_view(&self, event: &ViewEvent) -> Result<()> {
        {
            let mut items = self.items.write().await;
            let item = items
                .iter_mut()
                .find(|i| i.id == event.item_id)
                .ok_or_else(|| Error::not_found("item", &event.item_id))?;
            item.view_count = item.view_count.saturating_add(1);
        }
        if event.has_metadata() {
            push_bounded(&mut *self.views.write().await, event.clone(), self.log_capacity);
        }
        Ok(())
    }

    async fn record_install(&self, event: &InstallEvent) -> Result<()> {
        {
            let mut items = self.items.write().await;
            let item = items
                .iter_mut()
                .find(|i| i.id == event.item_id)
                .ok_or_else(|| Error::not_found("item", &event.item_id))?;
            item.install_count = item.install_count.saturating_add(1);
        }
        push_bounded(
            &mut *self.installs.write().await,
            event.clone(),
            self.log_capacity,
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn push_bounded<T>(log: &mut VecDeque<T>, event: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while log.len() >= capacity {
        log.pop_front();
    }
    log.push_back(event);
}

// ============================================================================
// Tests
// ============================================================================
