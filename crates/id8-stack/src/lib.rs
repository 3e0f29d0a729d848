//! Stack builder state for the ID8 marketplace.
//!
//! A stack is the visitor's selection of skills, agents, commands and
//! settings. This crate provides:
//!
//! - [`StackStore`]: the active selection plus named saved stacks
//! - [`StackItem`] / [`SavedStack`]: entries and the JSON exchange format
//! - [`StackStats`]: per-kind and per-category counts
//! - [`StackStorage`]: load/save hooks, with [`JsonFileStorage`] and
//!   [`MemoryStorage`]
//!
//! # Example
//!
//! ```
//! use id8_core::ItemKind;
//! use id8_stack::{MemoryStorage, StackItem, StackStore};
//!
//! let storage = MemoryStorage::new();
//! let mut store = StackStore::open(&storage).unwrap();
//! store.add_item(StackItem::new("s-1", "Commit Helper", ItemKind::Skill));
//! assert!(store.is_in_stack("s-1"));
//! store.persist(&storage).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod item;
pub mod storage;
pub mod store;

mod proptests;

pub use item::{SavedStack, StackItem, StackStats};
pub use storage::{JsonFileStorage, MemoryStorage, StackStorage};
pub use store::{DEFAULT_STACK_NAME, StackStore};
