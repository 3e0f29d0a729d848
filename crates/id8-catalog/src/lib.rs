//! Catalog query layer for the ID8 marketplace.
//!
//! Provides:
//! - [`CatalogBackend`]: search, listing, slug lookup and the view/install counters
//! - [`MemoryCatalog`]: in-process backend for development and tests
//! - [`RestCatalog`]: the managed database over its REST interface
//! - [`create_catalog_backend`]: picks a backend from `[catalog]` config
//!
//! Ranking is shared by every backend: exact name match first, then name
//! prefix, name substring and description-only matches, with install and view
//! counts breaking ties.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod memory;
pub mod rank;
pub mod rest;
pub mod types;

pub use backend::{CatalogBackend, UnconfiguredCatalog, create_catalog_backend};
pub use memory::{DEFAULT_EVENT_LOG_CAPACITY, MemoryCatalog};
pub use rank::{MatchQuality, listing_order, rank_items};
pub use rest::RestCatalog;
pub use types::{
    DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_LIMIT, InstallEvent, ListFilters, MAX_PAGE_SIZE,
    MAX_SEARCH_LIMIT, Page, PageRequest, StatusFilter, ViewEvent, clamp_search_limit,
};
