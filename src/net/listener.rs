//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind one listener per endpoint
//! - All-or-nothing: a failure releases every socket bound so far
//! - Report the actual local address (port 0 binds ephemeral ports)

use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    /// No endpoints were supplied.
    NoEndpoints,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { addr, source } => write!(f, "Failed to bind {}: {}", addr, source),
            ListenerError::NoEndpoints => write!(f, "No endpoints to bind"),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::NoEndpoints => None,
        }
    }
}

/// A bound TCP listener together with its resolved local address.
#[derive(Debug)]
pub struct BoundListener {
    /// The underlying TCP listener.
    pub inner: TcpListener,
    /// Address the socket is actually bound to.
    pub local_addr: SocketAddr,
}

/// Bind a single endpoint.
pub async fn bind(addr: SocketAddr) -> Result<BoundListener, ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenerError::Bind { addr, source })?;

    tracing::info!(
        requested = %addr,
        address = %local_addr,
        "Listener bound"
    );

    Ok(BoundListener {
        inner: listener,
        local_addr,
    })
}

/// Bind every endpoint in order.
///
/// If any bind fails the listeners bound so far are dropped (closing their
/// sockets) before the error is returned.
pub async fn bind_all(addrs: &[SocketAddr]) -> Result<Vec<BoundListener>, ListenerError> {
    if addrs.is_empty() {
        return Err(ListenerError::NoEndpoints);
    }

    let mut bound = Vec::with_capacity(addrs.len());
    for &addr in addrs {
        match bind(addr).await {
            Ok(listener) => bound.push(listener),
            Err(e) => {
                tracing::error!(address = %addr, error = %e, released = bound.len(), "Bind failed, releasing listeners");
                drop(bound);
                return Err(e);
            }
        }
    }
    Ok(bound)
}
