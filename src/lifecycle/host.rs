//! The HTTP host context.
//!
//! # Responsibilities
//! - Own the endpoint registry and the single engine instance
//! - Drive `NotStarted → Starting → Running → Stopping → Stopped`
//! - Guarantee that no failure path leaves an engine or a socket behind
//!
//! # Design Decisions
//! - `start` seals the registry and leaves `NotStarted` in one step, under
//!   the lock registrations take; a racing `register` either made the
//!   table or fails
//! - A dropped `start` future still lands in `Faulted`
//! - The engine slot and the `Running` transition change together, under
//!   the slot's lock

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::{EngineConfig, HostSettings};
use crate::engine::{self, AxumEngineFactory, EngineFactory, EngineGuard, EnginePlan};
use crate::error::{HostError, HostResult, LifecycleViolation, StartPhase};
use crate::http::{Handler, SharedHandler};
use crate::lifecycle::state::HostLifecycleState;
use crate::net::{AddressResolver, DnsResolver};
use crate::observability::metrics;
use crate::routing::{EndpointRegistry, RouteKey, RouteTable};

/// Single-process HTTP host multiplexing path-scoped handlers onto one
/// embedded engine.
pub struct HttpHost {
    settings: HostSettings,
    registry: EndpointRegistry,
    resolver: Arc<dyn AddressResolver>,
    engines: Arc<dyn EngineFactory>,
    state: watch::Sender<HostLifecycleState>,
    engine: Mutex<Option<EngineGuard>>,
    span: tracing::Span,
}

impl HttpHost {
    /// Create a host with explicit collaborators.
    pub fn new(
        settings: HostSettings,
        resolver: impl AddressResolver + 'static,
        engines: impl EngineFactory + 'static,
    ) -> Self {
        let span = tracing::info_span!("http_host", host = %settings.name(), port = settings.port());
        let (state, _) = watch::channel(HostLifecycleState::NotStarted);
        Self {
            registry: EndpointRegistry::new(span.clone()),
            settings,
            resolver: Arc::new(resolver),
            engines: Arc::new(engines),
            state,
            engine: Mutex::new(None),
            span,
        }
    }

    /// Host resolving through DNS and serving with the Axum engine.
    pub fn with_axum(settings: HostSettings, engine: EngineConfig) -> Self {
        Self::new(settings, DnsResolver::new(), AxumEngineFactory::new(engine))
    }

    /// Replace the span the host and its registry log under.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.registry.set_span(span.clone());
        self.span = span;
        self
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HostLifecycleState {
        *self.state.borrow()
    }

    /// Observe lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<HostLifecycleState> {
        self.state.subscribe()
    }

    /// Register `handler` under `raw_path`. Only valid before `start`.
    pub fn register<H: Handler>(&self, raw_path: &str, handler: H) -> HostResult<()> {
        Ok(self.registry.register(raw_path, handler)?)
    }

    /// Register an already shared handler under `raw_path`.
    pub fn register_shared(&self, raw_path: &str, handler: SharedHandler) -> HostResult<()> {
        Ok(self.registry.register_shared(raw_path, handler)?)
    }

    /// Route keys in dispatch order.
    pub fn route_keys(&self) -> Vec<RouteKey> {
        self.registry.snapshot().keys().cloned().collect()
    }

    /// Addresses the running engine is bound to; empty unless running.
    pub async fn local_addrs(&self) -> Vec<SocketAddr> {
        self.engine
            .lock()
            .await
            .as_ref()
            .map(|engine| engine.local_addrs())
            .unwrap_or_default()
    }

    /// Start the host. Valid only once, from `NotStarted`.
    pub async fn start(&self, cancel: &CancellationToken) -> HostResult<()> {
        // `NotStarted → Starting` happens under the registry lock, so no
        // registration can succeed once the state has moved on.
        let Some((snapshot, attempt)) = self.registry.seal_if(|| StartAttempt::begin(self)) else {
            let state = self.state();
            tracing::warn!(parent: &self.span, state = %state, "Start rejected");
            return Err(LifecycleViolation::AlreadyStarted { state }.into());
        };
        tracing::info!(parent: &self.span, "Host starting");

        let table = RouteTable::build(&snapshot);

        match self.launch(table, cancel).await {
            Ok(guard) => {
                let addresses = guard.local_addrs();
                let mut slot = self.engine.lock().await;
                *slot = Some(guard);
                attempt.finish(HostLifecycleState::Running);
                drop(slot);

                tracing::info!(
                    parent: &self.span,
                    addresses = ?addresses,
                    routes = snapshot.len(),
                    "Host running"
                );
                Ok(())
            }
            Err(e) => {
                attempt.finish(HostLifecycleState::Faulted);
                tracing::error!(parent: &self.span, error = %e, "Host failed to start");
                Err(e)
            }
        }
    }

    /// Resolve, build and start the engine. Any engine built here is
    /// disposed by its guard if this returns an error.
    async fn launch(&self, table: RouteTable, cancel: &CancellationToken) -> HostResult<EngineGuard> {
        let host = self.settings.name();
        let resolved = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HostError::Cancelled(StartPhase::Resolving)),
            resolved = self.resolver.resolve(host) => resolved,
        };
        let addrs = resolved.map_err(|source| HostError::ResolutionFailure {
            host: host.to_string(),
            source,
        })?;

        let endpoints = addrs
            .into_iter()
            .map(|ip| SocketAddr::new(ip, self.settings.port()))
            .collect();
        let plan = EnginePlan::new(endpoints, table);
        tracing::debug!(parent: &self.span, endpoints = ?plan.endpoints, "Bind addresses resolved");

        let mut guard = engine::build(self.engines.as_ref(), &plan).map_err(HostError::EngineStartFailure)?;
        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HostError::Cancelled(StartPhase::StartingEngine)),
            started = guard.start(cancel) => started.map_err(HostError::EngineStartFailure),
        };
        started?;
        Ok(guard)
    }

    /// Stop the host. Idempotent and safe from any state.
    ///
    /// `cancel` bounds the graceful drain; once it fires the engine is
    /// released regardless. An engine stop error is returned after disposal.
    pub async fn stop(&self, cancel: &CancellationToken) -> HostResult<()> {
        let was_running = self.state.send_if_modified(|state| {
            if *state == HostLifecycleState::Running {
                *state = HostLifecycleState::Stopping;
                true
            } else {
                false
            }
        });

        let mut slot = self.engine.lock().await;
        if !was_running {
            // Never touch an engine a concurrent start is about to publish.
            if self.state().is_terminal() {
                if let Some(guard) = slot.take() {
                    guard.dispose();
                }
            }
            tracing::debug!(parent: &self.span, state = %self.state(), "Stop ignored, host not running");
            return Ok(());
        }

        metrics::record_transition(HostLifecycleState::Stopping);
        tracing::info!(parent: &self.span, "Host stopping");

        let result = match slot.take() {
            Some(mut guard) => {
                let stopped = guard.stop(cancel).await;
                guard.dispose();
                stopped
            }
            None => Ok(()),
        };
        self.set_state(HostLifecycleState::Stopped);
        drop(slot);

        match result {
            Ok(()) => {
                tracing::info!(parent: &self.span, "Host stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(parent: &self.span, error = %e, "Engine stop failed, resources released");
                Err(HostError::EngineStopFailure(e))
            }
        }
    }

    /// Stop, allowing in-flight requests `grace` to drain.
    pub async fn stop_within(&self, grace: Duration) -> HostResult<()> {
        let deadline = CancellationToken::new();
        let timer = {
            let deadline = deadline.clone();
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                deadline.cancel();
            })
        };
        let result = self.stop(&deadline).await;
        timer.abort();
        result
    }

    fn set_state(&self, state: HostLifecycleState) {
        self.state.send_replace(state);
        metrics::record_transition(state);
        tracing::debug!(parent: &self.span, state = %state, "Lifecycle transition");
    }
}

impl std::fmt::Debug for HttpHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHost")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .field("registry", &self.registry)
            .finish()
    }
}

/// An in-flight `start`. Lands in `Faulted` unless finished explicitly.
struct StartAttempt<'a> {
    host: &'a HttpHost,
    finished: bool,
}

impl<'a> StartAttempt<'a> {
    /// Move `NotStarted → Starting`, or `None` if the host already left
    /// `NotStarted`.
    fn begin(host: &'a HttpHost) -> Option<Self> {
        let begun = host.state.send_if_modified(|state| {
            if *state == HostLifecycleState::NotStarted {
                *state = HostLifecycleState::Starting;
                true
            } else {
                false
            }
        });
        if !begun {
            return None;
        }
        metrics::record_transition(HostLifecycleState::Starting);
        Some(Self { host, finished: false })
    }

    fn finish(mut self, state: HostLifecycleState) {
        self.finished = true;
        self.host.set_state(state);
    }
}

impl Drop for StartAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(parent: &self.host.span, "Start abandoned");
            self.host.set_state(HostLifecycleState::Faulted);
        }
    }
}
