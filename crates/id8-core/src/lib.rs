//! ID8 Core: shared types, errors, configuration and utilities.
//!
//! This crate provides the foundational types used across all ID8 crates.
//! It has no internal ID8 dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Catalog domain types (`CatalogItem`, `ItemKind`, `ItemStatus`)
//! - [`config`]: Layered configuration and the `ConfigManager` trait
//! - [`util`]: Slug and identifier helpers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod types;
pub mod util;

// Re-export key types at crate root for convenience
pub use config::{ConfigManager, Id8Config};
pub use error::{Error, Result};
pub use types::{CatalogItem, ItemKind, ItemStatus};

// Convenience re-exports from util
pub use util::ids::{normalize_slug, valid_item_id};
