//! HTTP engine subsystem.
//!
//! # Data Flow
//! ```text
//! EnginePlan { endpoints, route table }
//!     → build() (pure: create, listen × endpoints, map_route × entries)
//!     → EngineGuard (disposes exactly once, on every exit path)
//!     → start(token) → serving
//!     → stop(token)  → drained
//!     → dispose()    → sockets and tasks released
//! ```
//!
//! # Design Decisions
//! - The host only talks to the [`Engine`] trait; `server.rs` is the
//!   production adapter, tests script their own
//! - Construction is separated from start so a bind failure can be
//!   cleaned up by the same guard that cleans up a stop

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::http::SharedHandler;
use crate::net::ListenerError;
use crate::routing::{RouteKey, RouteTable};

mod connection;
pub mod dispatch;
pub mod server;

pub use server::{AxumEngine, AxumEngineFactory};

/// Errors raised by an engine adapter.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Binding a listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// `start` was called on an engine that is already serving.
    #[error("engine is already started")]
    AlreadyStarted,

    /// The engine was used after `dispose`.
    #[error("engine has been disposed")]
    Disposed,

    /// The start token fired before the engine was serving.
    #[error("engine start was cancelled")]
    Cancelled,

    /// A serve loop ended with an I/O error.
    #[error("serve loop failed: {0}")]
    Serve(#[source] std::io::Error),

    /// A serve task panicked or was aborted.
    #[error("serve task failed: {0}")]
    Join(String),

    /// The grace period ran out before all serve loops drained.
    #[error("graceful drain did not finish in time, aborted {aborted} task(s)")]
    DrainTimedOut { aborted: usize },

    /// Adapter-specific failure.
    #[error("{0}")]
    Other(String),
}

/// An embedded HTTP listener/dispatcher.
#[async_trait]
pub trait Engine: Send {
    /// Add an endpoint to listen on. Called once per endpoint, before `start`.
    fn listen(&mut self, addr: SocketAddr) -> Result<(), EngineError>;

    /// Map `handler` under `key`. Called in route table order, before `start`.
    fn map_route(&mut self, key: RouteKey, handler: SharedHandler) -> Result<(), EngineError>;

    /// Bind every endpoint and begin serving.
    async fn start(&mut self, cancel: &CancellationToken) -> Result<(), EngineError>;

    /// Stop accepting and drain in-flight requests until `cancel` fires.
    async fn stop(&mut self, cancel: &CancellationToken) -> Result<(), EngineError>;

    /// Release every OS resource the engine owns. Must be idempotent.
    fn dispose(&mut self);

    /// Addresses currently bound.
    fn local_addrs(&self) -> Vec<SocketAddr>;
}

/// Creates fresh, unconfigured engines.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Engine>, EngineError>;
}

/// Everything needed to construct an engine.
#[derive(Debug, Clone)]
pub struct EnginePlan {
    pub endpoints: Vec<SocketAddr>,
    pub routes: RouteTable,
}

impl EnginePlan {
    pub fn new(endpoints: Vec<SocketAddr>, routes: RouteTable) -> Self {
        Self { endpoints, routes }
    }
}

/// Construct an engine from `plan`.
///
/// The returned guard owns the engine. If configuring it fails part way, the
/// partially built engine is disposed before the error is returned.
pub fn build(factory: &dyn EngineFactory, plan: &EnginePlan) -> Result<EngineGuard, EngineError> {
    let mut guard = EngineGuard::new(factory.create()?);
    for &addr in &plan.endpoints {
        guard.listen(addr)?;
    }
    for entry in plan.routes.iter() {
        guard.map_route(entry.key.clone(), entry.handler.clone())?;
    }
    tracing::debug!(
        endpoints = plan.endpoints.len(),
        routes = plan.routes.len(),
        "Engine constructed"
    );
    Ok(guard)
}

/// Owns an engine and disposes it exactly once.
///
/// Disposal happens on [`EngineGuard::dispose`] or, failing that, on drop.
pub struct EngineGuard {
    engine: Box<dyn Engine>,
    disposed: bool,
}

impl EngineGuard {
    pub fn new(engine: Box<dyn Engine>) -> Self {
        Self {
            engine,
            disposed: false,
        }
    }

    /// Dispose now instead of at end of scope.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.engine.dispose();
            tracing::debug!("Engine disposed");
        }
    }
}

impl std::ops::Deref for EngineGuard {
    type Target = dyn Engine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref()
    }
}

impl std::ops::DerefMut for EngineGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine.as_mut()
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for EngineGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineGuard")
            .field("disposed", &self.disposed)
            .field("local_addrs", &self.engine.local_addrs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::respond;
    use crate::routing::EndpointRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Record {
        listens: Mutex<Vec<SocketAddr>>,
        routes: Mutex<Vec<String>>,
        disposals: AtomicUsize,
    }

    struct RecordingEngine {
        record: Arc<Record>,
        fail_on_route: Option<&'static str>,
    }

    #[async_trait]
    impl Engine for RecordingEngine {
        fn listen(&mut self, addr: SocketAddr) -> Result<(), EngineError> {
            self.record.listens.lock().unwrap().push(addr);
            Ok(())
        }

        fn map_route(&mut self, key: RouteKey, _handler: SharedHandler) -> Result<(), EngineError> {
            if self.fail_on_route == Some(key.as_str()) {
                return Err(EngineError::Other("rejected".into()));
            }
            self.record.routes.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn start(&mut self, _cancel: &CancellationToken) -> Result<(), EngineError> {
            Ok(())
        }

        async fn stop(&mut self, _cancel: &CancellationToken) -> Result<(), EngineError> {
            Ok(())
        }

        fn dispose(&mut self) {
            self.record.disposals.fetch_add(1, Ordering::SeqCst);
        }

        fn local_addrs(&self) -> Vec<SocketAddr> {
            Vec::new()
        }
    }

    struct RecordingFactory {
        record: Arc<Record>,
        fail_on_route: Option<&'static str>,
    }

    impl EngineFactory for RecordingFactory {
        fn create(&self) -> Result<Box<dyn Engine>, EngineError> {
            Ok(Box::new(RecordingEngine {
                record: self.record.clone(),
                fail_on_route: self.fail_on_route,
            }))
        }
    }

    fn plan(paths: &[&str]) -> EnginePlan {
        let registry = EndpointRegistry::default();
        for path in paths {
            registry.register(path, respond(|_req| async { "" })).unwrap();
        }
        EnginePlan::new(
            vec!["127.0.0.1:80".parse().unwrap(), "[::1]:80".parse().unwrap()],
            RouteTable::build(&registry.seal().unwrap()),
        )
    }

    #[test]
    fn test_build_listens_then_maps_in_order() {
        let record = Arc::new(Record::default());
        let factory = RecordingFactory { record: record.clone(), fail_on_route: None };

        let guard = build(&factory, &plan(&["/", "/health", "/orders"])).unwrap();
        assert_eq!(record.listens.lock().unwrap().len(), 2);
        assert_eq!(*record.routes.lock().unwrap(), vec!["/orders", "/health", ""]);
        assert_eq!(record.disposals.load(Ordering::SeqCst), 0);

        guard.dispose();
        assert_eq!(record.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_partial_build_is_disposed() {
        let record = Arc::new(Record::default());
        let factory = RecordingFactory { record: record.clone(), fail_on_route: Some("/health") };

        let err = build(&factory, &plan(&["/", "/health", "/orders"])).unwrap_err();
        assert!(matches!(err, EngineError::Other(_)));
        assert_eq!(record.disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_disposes_once() {
        let record = Arc::new(Record::default());
        let factory = RecordingFactory { record: record.clone(), fail_on_route: None };
        {
            let _guard = build(&factory, &plan(&["/a"])).unwrap();
        }
        assert_eq!(record.disposals.load(Ordering::SeqCst), 1);
    }
}
