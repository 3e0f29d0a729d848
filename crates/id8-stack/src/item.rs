//! Stack entries, saved stacks and derived statistics.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use id8_core::{CatalogItem, Error, ItemKind, Result, normalize_slug, valid_item_id};
use serde::{Deserialize, Serialize};

/// A catalog item as held in a stack.
///
/// Carries just enough of the catalog record to render and export the stack;
/// counters and publication state stay in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackItem {
    /// Catalog identifier; unique within a stack.
    pub id: String,

    /// URL slug. Filled from the name when an import omits it.
    #[serde(default)]
    pub slug: String,

    /// Display name.
    pub name: String,

    /// Short description.
    #[serde(default)]
    pub description: String,

    /// Item kind, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Category name.
    #[serde(default)]
    pub category: String,

    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StackItem {
    /// Create an entry with an empty description, category and tag list.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            slug: normalize_slug(&name),
            name,
            description: String::new(),
            kind,
            category: String::new(),
            tags: Vec::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Trim the id and fill a blank slug from the name.
    ///
    /// Returns `false`, leaving the entry untouched, when the id is unusable.
    pub(crate) fn normalize(&mut self) -> bool {
        let Some(id) = valid_item_id(&self.id).map(str::to_string) else {
            return false;
        };
        self.id = id;
        if self.slug.trim().is_empty() {
            self.slug = normalize_slug(&self.name);
        }
        true
    }
}

/// Normalize every entry of `items`, rejecting unusable or duplicate ids.
pub(crate) fn normalize_items(items: &mut [StackItem]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter_mut().enumerate() {
        if !item.normalize() {
            return Err(Error::validation_field(
                "items.id",
                format!("item {index} has an invalid id"),
            ));
        }
        if !seen.insert(item.id.clone()) {
            return Err(Error::validation_field(
                "items.id",
                format!("duplicate item id '{}'", item.id),
            ));
        }
    }
    Ok(())
}

impl From<&CatalogItem> for StackItem {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            slug: item.slug.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            kind: item.kind,
            category: item.category.clone(),
            tags: item.tags.iter().cloned().collect(),
        }
    }
}

/// A named snapshot of a stack; also the import/export format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStack {
    /// Stack name.
    pub name: String,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Entries in insertion order.
    pub items: Vec<StackItem>,
}

impl SavedStack {
    /// Snapshot `items` under `name`, stamped now.
    pub fn new(name: impl Into<String>, items: Vec<StackItem>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            items,
        }
    }

    /// Parse and validate the exchange format.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` for malformed JSON or missing fields and
    /// `Error::Validation` for blank or duplicate item identifiers.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut stack: SavedStack = serde_json::from_str(json)?;
        normalize_items(&mut stack.items)?;
        Ok(stack)
    }

    /// Serialize to pretty-printed exchange JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Per-kind counts for a stack, recomputed on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStats {
    /// Skills in the stack.
    pub skills: usize,
    /// Agents in the stack.
    pub agents: usize,
    /// Commands in the stack.
    pub commands: usize,
    /// Settings in the stack.
    pub settings: usize,
    /// All entries.
    pub total: usize,
    /// Entries per category; uncategorized items are not counted here.
    pub categories: BTreeMap<String, usize>,
}

impl StackStats {
    /// Tally `items`.
    pub fn from_items(items: &[StackItem]) -> Self {
        let mut stats = Self::default();
        for item in items {
            match item.kind {
                ItemKind::Skill => stats.skills += 1,
                ItemKind::Agent => stats.agents += 1,
                ItemKind::Command => stats.commands += 1,
                ItemKind::Setting => stats.settings += 1,
            }
            if !item.category.is_empty() {
                *stats.categories.entry(item.category.clone()).or_default() += 1;
            }
        }
        stats.total = items.len();
        stats
    }

    /// Count for one kind.
    pub fn count(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::Skill => self.skills,
            ItemKind::Agent => self.agents,
            ItemKind::Command => self.commands,
            ItemKind::Setting => self.settings,
        }
    }
}
