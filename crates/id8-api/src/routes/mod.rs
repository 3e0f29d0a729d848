//! Route groups.
//!
//! Each submodule exposes `router()` returning a `Router<Arc<AppState>>`;
//! [`crate::server::build_router`] merges them and applies the shared layers.

pub mod admin;
pub mod catalog;
pub mod health;
pub mod tracking;

use std::str::FromStr;

use id8_catalog::{ListFilters, PageRequest, StatusFilter};
use id8_core::{Error, ItemKind};
use serde::Deserialize;

/// Raw query string for listings.
///
/// Everything arrives as text and is parsed here so malformed values produce
/// the same JSON error body as every other validation failure.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    status: Option<String>,
    search: Option<String>,
    category: Option<String>,
    kind: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    featured: Option<String>,
}

impl ListParams {
    /// Parse into backend filters and a page request.
    ///
    /// `allow_all_statuses` is false on public routes, where a request for
    /// every status is served as published-only.
    pub fn parse(&self, allow_all_statuses: bool) -> Result<(ListFilters, PageRequest), Error> {
        let mut status = match self.status.as_deref() {
            Some(raw) => StatusFilter::from_str(raw)?,
            None => StatusFilter::Published,
        };
        if status == StatusFilter::All && !allow_all_statuses {
            tracing::debug!("status=all requested on a public listing; serving published only");
            status = StatusFilter::Published;
        }

        let kind = match self.kind.as_deref().or(self.item_type.as_deref()).map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(ItemKind::from_str(raw)?),
        };

        let filters = ListFilters {
            status,
            search: self.search.clone(),
            category: self.category.clone(),
            kind,
            featured_only: parse_flag("featured", self.featured.as_deref())?,
        };
        let page = PageRequest::new(
            parse_number("page", self.page.as_deref())?,
            parse_number("limit", self.limit.as_deref())?,
        );
        Ok((filters, page))
    }
}

/// Parse an optional non-negative integer query parameter.
pub fn parse_number(field: &str, raw: Option<&str>) -> Result<Option<usize>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<usize>().map(Some).map_err(|_| {
            Error::validation_field(field, format!("{field} must be a non-negative integer"))
        }),
    }
}

/// Parse an optional boolean query flag (`true`/`false`/`1`/`0`).
pub fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool, Error> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(_) => Err(Error::validation_field(
            field,
            format!("{field} must be true or false"),
        )),
    }
}
