//! The active stack and the user's saved stacks.

use id8_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::item::{SavedStack, StackItem, StackStats, normalize_items};
use crate::storage::StackStorage;

/// Name used for exports when the caller passes a blank one.
pub const DEFAULT_STACK_NAME: &str = "My Stack";

/// Session-owned stack builder state.
///
/// Holds the active selection plus any named snapshots. The store is a plain
/// value: load it with [`StackStore::open`] at session start, mutate it, and
/// write it back with [`StackStore::persist`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackStore {
    #[serde(default)]
    active: Vec<StackItem>,
    #[serde(default)]
    saved: Vec<SavedStack>,
}

impl StackStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted store, or start empty if nothing was saved.
    ///
    /// # Errors
    ///
    /// Besides storage errors, returns `Error::Validation` when the stored
    /// active selection or a saved stack holds blank or duplicate ids.
    pub fn open<S: StackStorage + ?Sized>(storage: &S) -> Result<Self> {
        let mut store = storage.load()?.unwrap_or_default();
        store.validate().inspect_err(|e| {
            log::warn!("Stored stack at {} is invalid: {e}", storage.describe());
        })?;
        log::debug!(
            "Opened stack store from {}: {} active item(s), {} saved stack(s)",
            storage.describe(),
            store.active.len(),
            store.saved.len()
        );
        Ok(store)
    }

    fn validate(&mut self) -> Result<()> {
        normalize_items(&mut self.active)?;
        for saved in &mut self.saved {
            normalize_items(&mut saved.items)?;
        }
        Ok(())
    }

    /// Write the store back to `storage`.
    pub fn persist<S: StackStorage + ?Sized>(&self, storage: &S) -> Result<()> {
        storage.save(self)?;
        log::debug!("Persisted stack store to {}", storage.describe());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Active selection
    // ------------------------------------------------------------------------

    /// Entries in insertion order.
    pub fn items(&self) -> &[StackItem] {
        &self.active
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether the active selection is empty.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Append `item` unless its id is already present.
    ///
    /// The id is trimmed first; items with an unusable id are not added.
    /// Returns `true` if the item was added.
    pub fn add_item(&mut self, mut item: StackItem) -> bool {
        if !item.normalize() {
            log::warn!("Ignoring stack item with invalid id {:?}", item.id);
            return false;
        }
        if self.is_in_stack(&item.id) {
            return false;
        }
        self.active.push(item);
        true
    }

    /// Remove the entry with `id`. Returns `true` if one was removed.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let id = id.trim();
        let before = self.active.len();
        self.active.retain(|i| i.id != id);
        self.active.len() != before
    }

    /// Remove `item` if present, otherwise add it.
    ///
    /// Returns whether the item is in the stack afterwards; an item with an
    /// unusable id is never added.
    pub fn toggle_item(&mut self, mut item: StackItem) -> bool {
        if !item.normalize() {
            log::warn!("Ignoring stack item with invalid id {:?}", item.id);
            return false;
        }
        if self.remove_item(&item.id) {
            false
        } else {
            self.active.push(item);
            true
        }
    }

    /// Whether an entry with `id` is present.
    pub fn is_in_stack(&self, id: &str) -> bool {
        let id = id.trim();
        self.active.iter().any(|i| i.id == id)
    }

    /// Empty the active selection. Saved stacks are kept.
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Per-kind and per-category counts of the active selection.
    pub fn stats(&self) -> StackStats {
        StackStats::from_items(&self.active)
    }

    // ------------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------------

    /// Replace the active selection with a serialized stack.
    ///
    /// Returns the number of imported entries. On error the store is left
    /// untouched.
    pub fn try_import(&mut self, serialized: &str) -> Result<usize> {
        let stack = SavedStack::from_json(serialized)?;
        let count = stack.items.len();
        self.active = stack.items;
        log::info!("Imported stack '{}' with {count} item(s)", stack.name);
        Ok(count)
    }

    /// Like [`try_import`](Self::try_import), reporting only success.
    pub fn import_stack(&mut self, serialized: &str) -> bool {
        match self.try_import(serialized) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Rejected stack import: {e}");
                false
            }
        }
    }

    /// Snapshot the active selection under `name`.
    pub fn snapshot(&self, name: &str) -> SavedStack {
        let name = match name.trim() {
            "" => DEFAULT_STACK_NAME,
            trimmed => trimmed,
        };
        SavedStack::new(name, self.active.clone())
    }

    /// Serialize the active selection in the exchange format.
    pub fn export_stack(&self, name: &str) -> String {
        // Plain structs with string keys; serialization cannot fail.
        self.snapshot(name).to_json().unwrap_or_else(|e| {
            log::error!("Failed to serialize stack: {e}");
            String::new()
        })
    }

    // ------------------------------------------------------------------------
    // Saved stacks
    // ------------------------------------------------------------------------

    /// Saved stacks, oldest first.
    pub fn saved_stacks(&self) -> &[SavedStack] {
        &self.saved
    }

    /// Save the active selection as `name`, replacing a stack of that name.
    pub fn save_stack(&mut self, name: &str) -> Result<&SavedStack> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation_field("name", "stack name cannot be empty"));
        }
        let snapshot = SavedStack::new(name, self.active.clone());
        let index = match self.saved.iter().position(|s| s.name == name) {
            Some(index) => {
                self.saved[index] = snapshot;
                index
            }
            None => {
                self.saved.push(snapshot);
                self.saved.len() - 1
            }
        };
        Ok(&self.saved[index])
    }

    /// Make the saved stack `name` the active selection.
    pub fn load_saved(&mut self, name: &str) -> Result<usize> {
        let stack = self
            .saved
            .iter()
            .find(|s| s.name == name.trim())
            .ok_or_else(|| Error::not_found("saved stack", name.trim()))?;
        self.active = stack.items.clone();
        Ok(self.active.len())
    }

    /// Delete the saved stack `name`. Returns `true` if it existed.
    pub fn delete_saved(&mut self, name: &str) -> bool {
        let before = self.saved.len();
        self.saved.retain(|s| s.name != name.trim());
        self.saved.len() != before
    }
}

// ============================================================================
// Tests
// ============================================================================
