//! Axum-backed engine adapter.
//!
//! # Responsibilities
//! - Collect endpoints and route entries before start
//! - Bind every endpoint, then spawn one accept loop per listener
//! - Graceful drain on stop, forced close once the stop token fires
//! - Abort everything still running on dispose

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::engine::{connection, dispatch, Engine, EngineError, EngineFactory};
use crate::http::SharedHandler;
use crate::lifecycle::shutdown::Drain;
use crate::net::listener::bind_all;
use crate::routing::{RouteEntry, RouteKey, RouteTable};

/// Engine serving the route table over Axum on one or more listeners.
pub struct AxumEngine {
    config: EngineConfig,
    endpoints: Vec<SocketAddr>,
    routes: Vec<RouteEntry>,
    bound: Vec<SocketAddr>,
    drain: Option<Drain>,
    disposed: bool,
}

impl AxumEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            endpoints: Vec::new(),
            routes: Vec::new(),
            bound: Vec::new(),
            drain: None,
            disposed: false,
        }
    }

    fn ensure_configurable(&self) -> Result<(), EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        if self.drain.is_some() {
            return Err(EngineError::AlreadyStarted);
        }
        Ok(())
    }
}

#[async_trait]
impl Engine for AxumEngine {
    fn listen(&mut self, addr: SocketAddr) -> Result<(), EngineError> {
        self.ensure_configurable()?;
        if !self.endpoints.contains(&addr) {
            self.endpoints.push(addr);
        }
        Ok(())
    }

    fn map_route(&mut self, key: RouteKey, handler: SharedHandler) -> Result<(), EngineError> {
        self.ensure_configurable()?;
        self.routes.push(RouteEntry { key, handler });
        Ok(())
    }

    async fn start(&mut self, cancel: &CancellationToken) -> Result<(), EngineError> {
        self.ensure_configurable()?;

        let listeners = bind_all(&self.endpoints).await?;
        if cancel.is_cancelled() {
            // Dropping `listeners` closes the sockets.
            return Err(EngineError::Cancelled);
        }

        let app = dispatch::router(RouteTable::from_entries(self.routes.clone()), &self.config);
        let mut drain = Drain::new();
        let mut bound = Vec::with_capacity(listeners.len());
        for listener in listeners {
            let address = listener.local_addr;
            let serve = connection::serve_listener(listener.inner, app.clone(), drain.signal());
            drain.track(tokio::spawn(async move {
                let result = serve.await;
                tracing::debug!(address = %address, "Serve loop exited");
                result
            }));
            bound.push(address);
        }

        tracing::info!(
            addresses = ?bound,
            routes = self.routes.len(),
            "Engine serving"
        );
        self.bound = bound;
        self.drain = Some(drain);
        Ok(())
    }

    async fn stop(&mut self, cancel: &CancellationToken) -> Result<(), EngineError> {
        let Some(mut drain) = self.drain.take() else {
            return Ok(());
        };
        tracing::info!(tasks = drain.len(), "Engine draining");
        let result = drain.shutdown(cancel).await;
        self.bound.clear();
        result
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(mut drain) = self.drain.take() {
            let aborted = drain.abort();
            tracing::debug!(aborted, "Engine serve tasks aborted");
        }
        self.bound.clear();
        self.routes.clear();
    }

    fn local_addrs(&self) -> Vec<SocketAddr> {
        self.bound.clone()
    }
}

/// Builds [`AxumEngine`]s with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct AxumEngineFactory {
    config: EngineConfig,
}

impl AxumEngineFactory {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl EngineFactory for AxumEngineFactory {
    fn create(&self) -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(AxumEngine::new(self.config.clone())))
    }
}
