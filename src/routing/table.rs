//! Route table handed to the engine at start.

use std::sync::Arc;

use crate::http::SharedHandler;
use crate::routing::path::RouteKey;
use crate::routing::registry::RegistrySnapshot;

/// One `(route key, handler)` pair in precedence order.
#[derive(Clone)]
pub struct RouteEntry {
    pub key: RouteKey,
    pub handler: SharedHandler,
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry").field("key", &self.key.as_str()).finish()
    }
}

/// Immutable, ordered route table.
///
/// Entries appear in snapshot order (larger keys first) and, within a key,
/// in registration order. Cloning shares the underlying entries.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Arc<[RouteEntry]>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
        }
    }
}

impl RouteTable {
    /// Flatten a registry snapshot into route table order.
    pub fn build(snapshot: &RegistrySnapshot) -> Self {
        let entries: Vec<RouteEntry> = snapshot
            .iter()
            .flat_map(|(key, handlers)| {
                handlers.iter().map(move |handler| RouteEntry {
                    key: key.clone(),
                    handler: Arc::clone(handler),
                })
            })
            .collect();
        Self {
            entries: entries.into(),
        }
    }

    /// Table from entries already in dispatch order.
    pub fn from_entries(entries: Vec<RouteEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose key matches `path`, in dispatch order.
    pub fn candidates<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a RouteEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.key.matches(path))
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
