//! Route keys and path normalization.
//!
//! # Responsibilities
//! - Turn a raw path-match string into a canonical [`RouteKey`]
//! - Compare and order keys case-insensitively
//! - Decide whether a request path falls under a key
//!
//! # Design Decisions
//! - Normalization only adds a missing leading `/`; no decoding, no
//!   trailing-slash collapsing
//! - The root is the empty key; `"/"` is treated as another spelling of it
//! - Case is preserved for display, ignored for comparison

use std::cmp::Ordering;
use std::fmt;

/// Canonical path prefix a handler is mapped under.
///
/// Either empty (the root) or starting with `/`. Equality, ordering and
/// hashing are ASCII case-insensitive; the original spelling is kept.
#[derive(Debug, Clone, Default)]
pub struct RouteKey(String);

impl RouteKey {
    /// The root key, matching every path.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns true for the root key.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First-match prefix test on segment boundaries.
    ///
    /// `/orders` matches `/orders`, `/ORDERS/7` but not `/ordersx`.
    pub fn matches(&self, path: &str) -> bool {
        if self.is_root() {
            return true;
        }
        let key = self.0.as_bytes();
        let path = path.as_bytes();
        if path.len() < key.len() || !path[..key.len()].eq_ignore_ascii_case(key) {
            return false;
        }
        // A key ending in `/` already sits on a boundary.
        path.len() == key.len() || key.ends_with(b"/") || path[key.len()] == b'/'
    }
}

impl PartialEq for RouteKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for RouteKey {}

impl PartialOrd for RouteKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RouteKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.0.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl std::hash::Hash for RouteKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteKey {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

/// Normalize a raw path-match string into a [`RouteKey`].
pub fn normalize(raw: &str) -> RouteKey {
    if raw.trim().is_empty() || raw == "/" {
        return RouteKey::root();
    }
    if raw.starts_with('/') {
        RouteKey(raw.to_string())
    } else {
        RouteKey(format!("/{raw}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert!(normalize("").is_root());
        assert!(normalize("  ").is_root());
        assert!(normalize("\t\n").is_root());
        assert!(normalize("/").is_root());
        assert_eq!(normalize("orders").as_str(), "/orders");
        assert_eq!(normalize("/orders").as_str(), "/orders");
        // No further cleanup is applied.
        assert_eq!(normalize("/orders/").as_str(), "/orders/");
        assert_eq!(normalize("//orders").as_str(), "//orders");
        assert_eq!(normalize(" orders").as_str(), "/ orders");
        assert_eq!(normalize("Orders").as_str(), "/Orders");
    }

    #[test]
    fn test_case_insensitive_comparison() {
        assert_eq!(normalize("/Orders"), normalize("/orders"));
        assert_eq!(normalize("/Orders").as_str(), "/Orders");
        assert!(normalize("/Health") < normalize("/orders"));
        assert!(RouteKey::root() < normalize("/a"));
    }

    #[test]
    fn test_matches() {
        let key = normalize("/orders");
        assert!(key.matches("/orders"));
        assert!(key.matches("/Orders/42"));
        assert!(!key.matches("/ordersx"));
        assert!(!key.matches("/order"));
        assert!(!key.matches("/health"));

        let slash = normalize("/static/");
        assert!(slash.matches("/static/app.js"));
        assert!(!slash.matches("/static"));

        assert!(RouteKey::root().matches("/anything"));
        assert!(RouteKey::root().matches(""));
    }
}
