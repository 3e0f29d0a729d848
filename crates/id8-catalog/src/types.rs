//! Query parameters, pages and tracking events.
//!
//! These types are backend-agnostic; the HTTP layer builds them from query
//! strings and request bodies.

use std::fmt;
use std::str::FromStr;

use id8_core::{Error, ItemKind};
use serde::{Deserialize, Serialize};

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Hard cap on search results.
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard cap on listing page size.
pub const MAX_PAGE_SIZE: usize = 100;

/// Clamp a requested search limit to `1..=MAX_SEARCH_LIMIT`.
pub fn clamp_search_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}

/// Which publication states a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// Published items only.
    #[default]
    Published,
    /// Drafts and archived items too.
    All,
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published => f.write_str("published"),
            Self::All => f.write_str("all"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "published" => Ok(Self::Published),
            "all" => Ok(Self::All),
            other => Err(Error::validation_field(
                "status",
                format!("unknown status filter '{other}'"),
            )),
        }
    }
}

/// Filters for a catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilters {
    /// Publication filter.
    #[serde(default)]
    pub status: StatusFilter,

    /// Case-insensitive substring on name or description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Exact category match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Restrict to one item kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ItemKind>,

    /// Only featured items.
    #[serde(default)]
    pub featured_only: bool,
}

impl ListFilters {
    /// Search text with surrounding whitespace removed, if any is left.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Category with surrounding whitespace removed, if any is left.
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Offset pagination request (1-based pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: usize,
    /// Items per page.
    pub limit: usize,
}

impl PageRequest {
    /// Build a request, normalizing page 0 to 1 and clamping the size.
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching rows.
    pub total: usize,
    /// Page number (1-based).
    pub page: usize,
    /// Page size.
    pub limit: usize,
    /// Number of pages at this size.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Assemble a page from its rows and the total count.
    pub fn new(items: Vec<T>, total: usize, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total.div_ceil(request.limit),
        }
    }
}

/// A detail-page view to count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEvent {
    /// Viewed item.
    pub item_id: String,
    /// Anonymous visitor session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// HTTP referrer of the page view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl ViewEvent {
    /// A view with no session metadata.
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            session_id: None,
            referrer: None,
        }
    }

    /// Whether there is metadata worth logging beyond the counter.
    pub fn has_metadata(&self) -> bool {
        self.session_id.is_some() || self.referrer.is_some()
    }
}

/// An install to count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallEvent {
    /// Installed item.
    pub item_id: String,
    /// How it was installed ("copy", "cli", "download", ...).
    pub method: String,
    /// Client platform, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl InstallEvent {
    /// Install method recorded when the client does not say.
    pub const UNKNOWN_METHOD: &'static str = "unknown";

    /// An install with an unknown method.
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            method: Self::UNKNOWN_METHOD.to_string(),
            platform: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
