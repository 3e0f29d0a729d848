//! Identifier and slug utilities.
//!
//! Item identifiers arrive from untrusted request bodies and imported stack
//! files, so they are validated before they reach a counter or a store.

/// Longest identifier accepted from clients.
pub const MAX_ID_LEN: usize = 128;

/// Normalize a display name to a lowercase kebab-case slug.
///
/// Performs the following transformations:
/// 1. Trims leading/trailing whitespace
/// 2. Converts to lowercase
/// 3. Treats underscores and slashes as word separators
/// 4. Collapses whitespace runs into single hyphens
///
/// # Examples
///
/// ```
/// use id8_core::util::ids::normalize_slug;
///
/// assert_eq!(normalize_slug("Prompt Kit"), "prompt-kit");
/// assert_eq!(normalize_slug("code_review/agent"), "code-review-agent");
/// assert_eq!(normalize_slug("  Mixed   Case  "), "mixed-case");
/// ```
pub fn normalize_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['_', '/'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
}

/// Validate a client-supplied item identifier, returning the trimmed form.
///
/// Returns `None` for empty identifiers, identifiers longer than
/// [`MAX_ID_LEN`], and identifiers containing control characters.
///
/// ```
/// use id8_core::util::ids::valid_item_id;
///
/// assert_eq!(valid_item_id(" skill-42 "), Some("skill-42"));
/// assert_eq!(valid_item_id("   "), None);
/// ```
pub fn valid_item_id(id: &str) -> Option<&str> {
    let id = id.trim();
    if id.is_empty() || id.len() > MAX_ID_LEN || id.chars().any(char::is_control) {
        return None;
    }
    Some(id)
}
