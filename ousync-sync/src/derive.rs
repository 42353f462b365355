//! Canonical name → OU path.
//!
//! A canonical name lists containers from the domain down to the object:
//! `contoso.com/Sales/EMEA/Jane Doe`. The OU path is everything up to and
//! including the last separator: `contoso.com/Sales/EMEA/`.
//!
//! Inside a canonical name a literal `/` in a component is escaped as `\/`,
//! so the leaf must be escaped the same way before it is removed.

use ousync_core::config::MAX_PATH_LEN;
use ousync_core::DirectoryObject;

/// Escape `/` in a leaf name the way canonical names do.
pub fn escape_leaf(name: &str) -> String {
    name.replace('/', "\\/")
}

/// Remove the object's own component from `canonical_name`.
///
/// Strips the escaped `leaf` from the end. If the canonical name does not end
/// with `/<escaped leaf>` (or there is no leaf), cuts after the last
/// unescaped `/` instead.
pub fn parent_path(canonical_name: &str, leaf: Option<&str>) -> String {
    if let Some(leaf) = leaf.filter(|l| !l.is_empty()) {
        let escaped = escape_leaf(leaf);
        if let Some(parent) = canonical_name.strip_suffix(escaped.as_str()) {
            if parent.ends_with('/') {
                return parent.to_string();
            }
        }
    }
    match last_unescaped_separator(canonical_name) {
        Some(idx) => canonical_name[..=idx].to_string(),
        None => canonical_name.to_string(),
    }
}

/// Cut `path` to at most `max` characters.
pub fn truncate(path: &str, max: usize) -> String {
    match path.char_indices().nth(max) {
        Some((byte_idx, _)) => path[..byte_idx].to_string(),
        None => path.to_string(),
    }
}

/// The value the custom attribute should hold, or `None` without a canonical name.
pub fn derive_path(object: &DirectoryObject, truncate_paths: bool) -> Option<String> {
    let canonical = object
        .canonical_name
        .as_deref()
        .filter(|c| !c.is_empty())?;
    let path = parent_path(canonical, object.name.as_deref());
    if truncate_paths {
        Some(truncate(&path, MAX_PATH_LEN))
    } else {
        Some(path)
    }
}

fn last_unescaped_separator(s: &str) -> Option<usize> {
    let mut last = None;
    let mut escaped = false;
    for (idx, ch) in s.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => last = Some(idx),
            _ => {}
        }
    }
    last
}
