//! Per-listener accept loop and per-connection serving.
//!
//! # Responsibilities
//! - Accept TCP connections and serve each one over HTTP/1.1 on its own task
//! - Keep every connection task owned by its listener's `JoinSet`
//! - Graceful shutdown: stop accepting, let in-flight requests finish
//! - Forced shutdown: drop every connection, closing its socket and
//!   dropping the handler future it was driving
//!
//! # Design Decisions
//! - The accept loop returns only after all of its connection tasks have
//!   ended, so a joined serve task means no socket is left open

use std::io;
use std::net::SocketAddr;

use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::lifecycle::shutdown::ShutdownSignal;

/// Accept and serve connections on `listener` until shutdown.
pub(crate) async fn serve_listener(listener: TcpListener, app: Router, signal: ShutdownSignal) -> io::Result<()> {
    let address = listener.local_addr()?;
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = signal.graceful() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(stream, peer, app.clone(), signal.clone()));
                }
                Err(e) => tracing::warn!(address = %address, error = %e, "Failed to accept connection"),
            },
        }
    }

    drop(listener);
    tracing::debug!(address = %address, open = connections.len(), "Listener closed, draining connections");

    loop {
        tokio::select! {
            biased;
            _ = signal.forced() => {
                let aborted = connections.len();
                connections.abort_all();
                while connections.join_next().await.is_some() {}
                tracing::warn!(address = %address, aborted, "Connections closed forcibly");
                break;
            }
            joined = connections.join_next() => {
                if joined.is_none() {
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, app: Router, signal: ShutdownSignal) {
    let service = service_fn(move |request: Request<Incoming>| app.clone().oneshot(request));
    let connection = http1::Builder::new()
        .timer(TokioTimer::new())
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let result = tokio::select! {
        biased;
        _ = signal.forced() => return,
        result = connection.as_mut() => result,
        _ = signal.graceful() => {
            connection.as_mut().graceful_shutdown();
            tokio::select! {
                biased;
                _ = signal.forced() => return,
                result = connection.as_mut() => result,
            }
        }
    };

    if let Err(e) = result {
        tracing::debug!(peer = %peer, error = %e, "Connection ended with error");
    }
}
