//! Match-quality ranking and listing order.
//!
//! Search ranks by how well the query matches the item name, then by
//! popularity. Both backends share these functions so in-memory and
//! database-backed search order results identically.

use std::cmp::Ordering;

use id8_core::CatalogItem;

/// How a query matched an item, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    /// Name equals the query (ignoring case).
    ExactName,
    /// Name starts with the query.
    NamePrefix,
    /// Name contains the query.
    NameContains,
    /// Only the description contains the query.
    Description,
}

/// Classify how `needle` (already lowercased) matches `item`.
pub fn match_quality(item: &CatalogItem, needle: &str) -> Option<MatchQuality> {
    if needle.is_empty() {
        return None;
    }
    let name = item.name.to_lowercase();
    if name == needle {
        Some(MatchQuality::ExactName)
    } else if name.starts_with(needle) {
        Some(MatchQuality::NamePrefix)
    } else if name.contains(needle) {
        Some(MatchQuality::NameContains)
    } else if item.description.to_lowercase().contains(needle) {
        Some(MatchQuality::Description)
    } else {
        None
    }
}

/// Whether `item` matches free-text `query` on name or description.
pub fn matches_text(item: &CatalogItem, query: &str) -> bool {
    match_quality(item, &query.trim().to_lowercase()).is_some()
}

/// Popularity tie-break: installs desc, views desc, name asc.
pub fn by_popularity(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.install_count
        .cmp(&a.install_count)
        .then_with(|| b.view_count.cmp(&a.view_count))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Listing order: featured first, then popularity.
pub fn listing_order(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.featured.cmp(&a.featured).then_with(|| by_popularity(a, b))
}

/// Filter `items` to those matching `query`, rank them, and keep `limit`.
///
/// A blank query yields no results.
pub fn rank_items<I>(items: I, query: &str, limit: usize) -> Vec<CatalogItem>
where
    I: IntoIterator<Item = CatalogItem>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(MatchQuality, CatalogItem)> = items
        .into_iter()
        .filter_map(|item| match_quality(&item, &needle).map(|q| (q, item)))
        .collect();

    scored.sort_by(|(qa, a), (qb, b)| qa.cmp(qb).then_with(|| by_popularity(a, b)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, item)| item).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use id8_core::ItemKind;

    fn item(id: &str, name: &str, description: &str, installs: u64) -> CatalogItem {
        CatalogItem::new(id, id, name, ItemKind::Skill)
            .with_description(description)
            .with_counts(installs, 0)
    }

    #[test]
    fn test_match_quality_tiers() {
        let it = item("a", "Code Review", "Reviews pull requests", 0);
        assert_eq!(match_quality(&it, "code review"), Some(MatchQuality::ExactName));
        assert_eq!(match_quality(&it, "code"), Some(MatchQuality::NamePrefix));
        assert_eq!(match_quality(&it, "review"), Some(MatchQuality::NameContains));
        assert_eq!(match_quality(&it, "pull"), Some(MatchQuality::Description));
        assert_eq!(match_quality(&it, "deploy"), None);
        assert_eq!(match_quality(&it, ""), None);
    }

    #[test]
    fn test_exact_name_beats_description_match() {
        let items = vec![
            // Popular, but only the description mentions the query.
            item("popular", "Swiss Army Agent", "Also does a commit helper job", 10_000),
            item("exact", "Commit Helper", "Writes messages", 3),
        ];
        let ranked = rank_items(items, "commit helper", 10);
        let ids: Vec<_> = ranked.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "popular"]);
    }

    #[test]
    fn test_popularity_breaks_ties() {
        let items = vec![
            item("low", "Test Writer", "", 5),
            item("high", "Test Runner", "", 50),
        ];
        let ranked = rank_items(items, "test", 10);
        assert_eq!(ranked[0].id, "high");
    }

    #[test]
    fn test_rank_items_limit_and_blank_query() {
        let items: Vec<_> = (0..5)
            .map(|i| item(&format!("i{i}"), &format!("Lint {i}"), "", i))
            .collect();
        assert_eq!(rank_items(items.clone(), "lint", 2).len(), 2);
        assert!(rank_items(items, "   ", 10).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let it = item("a", "SQL Tuner", "Optimizes QUERIES", 0);
        assert!(matches_text(&it, "sql"));
        assert!(matches_text(&it, "queries"));
        assert!(!matches_text(&it, "graphql"));
    }

    #[test]
    fn test_listing_order_featured_first() {
        let mut a = item("a", "Alpha", "", 1);
        let b = item("b", "Beta", "", 100);
        a.featured = true;
        let mut items = vec![b, a];
        items.sort_by(listing_order);
        assert_eq!(items[0].id, "a");
    }
}
