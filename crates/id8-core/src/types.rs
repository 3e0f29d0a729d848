//! Marketplace domain types shared by the catalog, tracking and stack crates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The four kinds of marketplace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A reusable skill.
    Skill,
    /// An agent definition.
    Agent,
    /// A slash command.
    Command,
    /// A settings preset.
    Setting,
}

impl ItemKind {
    /// All kinds, in display order.
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Skill,
        ItemKind::Agent,
        ItemKind::Command,
        ItemKind::Setting,
    ];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Agent => "agent",
            Self::Command => "command",
            Self::Setting => "setting",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skill" | "skills" => Ok(Self::Skill),
            "agent" | "agents" => Ok(Self::Agent),
            "command" | "commands" => Ok(Self::Command),
            "setting" | "settings" => Ok(Self::Setting),
            other => Err(Error::validation_field(
                "type",
                format!("unknown item type '{other}'"),
            )),
        }
    }
}

/// Publication status of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet visible to visitors.
    Draft,
    /// Listed publicly.
    #[default]
    Published,
    /// Withdrawn from the public listing.
    Archived,
}

impl ItemStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marketplace entry as stored by the managed database.
///
/// Read-only from the client's perspective except for the two counters,
/// which only change through the tracking endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Stable identifier.
    pub id: String,

    /// URL slug.
    pub slug: String,

    /// Display name.
    pub name: String,

    /// Short description.
    #[serde(default)]
    pub description: String,

    /// Which kind of entry this is.
    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Category (exact-match filter key).
    #[serde(default)]
    pub category: String,

    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Publication status.
    #[serde(default)]
    pub status: ItemStatus,

    /// Reviewed by the ID8 team.
    #[serde(default)]
    pub verified: bool,

    /// Pinned to the top of listings.
    #[serde(default)]
    pub featured: bool,

    /// Number of recorded installs.
    #[serde(default)]
    pub install_count: u64,

    /// Number of recorded detail views.
    #[serde(default)]
    pub view_count: u64,

    /// Author handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogItem {
    /// Create a published item with empty metadata.
    pub fn new(
        id: impl Into<String>,
        slug: impl Into<String>,
        name: impl Into<String>,
        kind: ItemKind,
    ) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            name: name.into(),
            description: String::new(),
            kind,
            category: String::new(),
            tags: BTreeSet::new(),
            status: ItemStatus::Published,
            verified: false,
            featured: false,
            install_count: 0,
            view_count: 0,
            author: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder-style description setter.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style category setter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder-style tag setter.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style counter setter.
    pub fn with_counts(mut self, installs: u64, views: u64) -> Self {
        self.install_count = installs;
        self.view_count = views;
        self
    }

    /// Builder-style featured flag.
    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    /// Whether the item is publicly listed.
    pub fn is_published(&self) -> bool {
        self.status == ItemStatus::Published
    }
}

// ============================================================================
// Tests
// ============================================================================
