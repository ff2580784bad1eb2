//! Endpoint registry.
//!
//! # Responsibilities
//! - Collect `(path, handler)` registrations before the host starts
//! - Group handlers per route key, preserving registration order
//! - Seal itself atomically when the host starts
//!
//! # Design Decisions
//! - One `std::sync::Mutex` guards both the map and the sealed flag, so a
//!   registration either lands before the seal or fails after it
//! - The lock is never held across an `.await`
//! - Snapshots copy handler handles out; the map is never shared

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::LifecycleViolation;
use crate::http::{Handler, SharedHandler};
use crate::observability::metrics;
use crate::routing::path::{normalize, RouteKey};

#[derive(Default)]
struct RegistryState {
    sealed: bool,
    entries: BTreeMap<RouteKey, Vec<SharedHandler>>,
}

/// Thread-safe store of route key to ordered handler list.
pub struct EndpointRegistry {
    inner: Mutex<RegistryState>,
    span: tracing::Span,
}

impl EndpointRegistry {
    /// Create an empty, open registry logging under `span`.
    pub fn new(span: tracing::Span) -> Self {
        Self {
            inner: Mutex::new(RegistryState::default()),
            span,
        }
    }

    pub(crate) fn set_span(&mut self, span: tracing::Span) {
        self.span = span;
    }

    /// Register `handler` under the normalized form of `raw_path`.
    pub fn register<H: Handler>(&self, raw_path: &str, handler: H) -> Result<(), LifecycleViolation> {
        self.register_shared(raw_path, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn register_shared(&self, raw_path: &str, handler: SharedHandler) -> Result<(), LifecycleViolation> {
        let key = normalize(raw_path);
        let position = {
            let mut state = self.lock();
            if state.sealed {
                drop(state);
                tracing::warn!(parent: &self.span, route = %key, "Registration rejected, host already started");
                return Err(LifecycleViolation::RegisterAfterStart);
            }
            let handlers = state.entries.entry(key.clone()).or_default();
            handlers.push(handler);
            handlers.len()
        };

        metrics::record_registration();
        tracing::debug!(parent: &self.span, route = %key, position, "Handler registered");
        Ok(())
    }

    /// Close the registry for writes and return its contents.
    ///
    /// Returns `None` if the registry was already sealed.
    pub fn seal(&self) -> Option<RegistrySnapshot> {
        self.seal_if(|| Some(())).map(|(snapshot, ())| snapshot)
    }

    /// Seal only if `admit` agrees, running it under the registry lock.
    ///
    /// A concurrent `register` waits for `admit` to return, so whatever
    /// `admit` changes is visible to every registration that fails.
    pub(crate) fn seal_if<T>(&self, admit: impl FnOnce() -> Option<T>) -> Option<(RegistrySnapshot, T)> {
        let mut state = self.lock();
        if state.sealed {
            return None;
        }
        let admitted = admit()?;
        state.sealed = true;
        let snapshot = RegistrySnapshot::from_entries(&state.entries);
        drop(state);

        tracing::debug!(parent: &self.span, routes = snapshot.len(), "Registry sealed");
        Some((snapshot, admitted))
    }

    /// Copy of the current contents without sealing.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::from_entries(&self.lock().entries)
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    // A panicking registrant cannot leave the map half-updated, so a
    // poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new(tracing::Span::none())
    }
}

impl std::fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("EndpointRegistry")
            .field("sealed", &state.sealed)
            .field("routes", &state.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Independent copy of the registry, in route-table precedence order.
///
/// Keys are ordered case-insensitively ascending and then reversed, so the
/// root key comes last and never shadows a more specific prefix.
#[derive(Clone, Default)]
pub struct RegistrySnapshot {
    entries: Vec<(RouteKey, Vec<SharedHandler>)>,
}

impl RegistrySnapshot {
    fn from_entries(entries: &BTreeMap<RouteKey, Vec<SharedHandler>>) -> Self {
        Self {
            entries: entries
                .iter()
                .rev()
                .map(|(key, handlers)| (key.clone(), handlers.clone()))
                .collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &[SharedHandler])> {
        self.entries.iter().map(|(key, handlers)| (key, handlers.as_slice()))
    }

    /// Number of distinct route keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, handlers)| (key.as_str(), handlers.len())))
            .finish()
    }
}
