//! Shared utilities for lifecycle and serving tests.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http_host::engine::{Engine, EngineError, EngineFactory};
use http_host::http::SharedHandler;
use http_host::net::{AddressResolver, ResolveError};
use http_host::RouteKey;
use tokio_util::sync::CancellationToken;

/// Resolver returning a fixed answer.
#[derive(Clone)]
pub struct StaticResolver {
    answer: Result<Vec<IpAddr>, String>,
    delay: Duration,
}

impl StaticResolver {
    pub fn loopback() -> Self {
        Self::addrs(vec!["127.0.0.1".parse().unwrap()])
    }

    pub fn addrs(addrs: Vec<IpAddr>) -> Self {
        Self {
            answer: Ok(addrs),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(host: &str) -> Self {
        Self {
            answer: Err(host.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl AddressResolver for StaticResolver {
    async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer.clone().map_err(ResolveError::NoAddresses)
    }
}

/// What the scripted engine should do.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub fail_start: bool,
    pub fail_stop: bool,
    pub start_delay: Option<Duration>,
}

/// Counters shared between a test and every engine its factory creates.
#[derive(Debug, Default)]
pub struct Probe {
    pub created: AtomicUsize,
    pub listens: Mutex<Vec<SocketAddr>>,
    pub routes: Mutex<Vec<String>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub disposals: AtomicUsize,
    pub listening: AtomicBool,
}

impl Probe {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    pub fn listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }

    pub fn listens(&self) -> Vec<SocketAddr> {
        self.listens.lock().unwrap().clone()
    }
}

pub struct ScriptedEngine {
    script: Script,
    probe: Arc<Probe>,
    endpoints: Vec<SocketAddr>,
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn listen(&mut self, addr: SocketAddr) -> Result<(), EngineError> {
        self.probe.listens.lock().unwrap().push(addr);
        self.endpoints.push(addr);
        Ok(())
    }

    fn map_route(&mut self, key: RouteKey, _handler: SharedHandler) -> Result<(), EngineError> {
        self.probe.routes.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn start(&mut self, _cancel: &CancellationToken) -> Result<(), EngineError> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        // Sockets are "bound" before the start can fail.
        self.probe.listening.store(true, Ordering::SeqCst);
        if let Some(delay) = self.script.start_delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_start {
            return Err(EngineError::Other("address already in use".into()));
        }
        Ok(())
    }

    async fn stop(&mut self, _cancel: &CancellationToken) -> Result<(), EngineError> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_stop {
            return Err(EngineError::Other("listener close failed".into()));
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.probe.disposals.fetch_add(1, Ordering::SeqCst);
        self.probe.listening.store(false, Ordering::SeqCst);
    }

    fn local_addrs(&self) -> Vec<SocketAddr> {
        if self.probe.listening() {
            self.endpoints.clone()
        } else {
            Vec::new()
        }
    }
}

#[derive(Clone, Default)]
pub struct ScriptedFactory {
    pub script: Script,
    pub probe: Arc<Probe>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            probe: Arc::new(Probe::default()),
        }
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&self) -> Result<Box<dyn Engine>, EngineError> {
        self.probe.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEngine {
            script: self.script.clone(),
            probe: self.probe.clone(),
            endpoints: Vec::new(),
        }))
    }
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap().port()
}
