//! HTTP host (v1)
//!
//! Runs a single embedded HTTP listener with path-scoped handlers.
//!
//! # Architecture Overview
//!
//! ```text
//!   register("/health", …) ─┐
//!   register("/", …) ───────┼─▶ EndpointRegistry ──seal──▶ RouteTable
//!                           │                                  │
//!                           │        HttpHost::start           ▼
//!   HostSettings ───────────┴─▶ resolve ─▶ engine::build ─▶ AxumEngine
//!                                                              │
//!     Client Request ─────────────────────────▶ first-match dispatch
//!                                                              │
//!   SIGTERM / Ctrl+C ─▶ HttpHost::stop_within(grace) ─▶ drain ─┘─▶ dispose
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{body::Body, http::Request, Json};
use clap::Parser;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use http_host::config::{load_config, HostConfig, HostSettings};
use http_host::http::RequestExt;
use http_host::lifecycle::signals::shutdown_signal;
use http_host::observability;
use http_host::{respond, HttpHost};

#[derive(Parser)]
#[command(name = "http-host")]
#[command(about = "Single-process HTTP host with path-scoped handlers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the host name to bind.
    #[arg(long)]
    host: Option<String>,

    /// Override the port to bind.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if cli.host.is_some() || cli.port.is_some() {
        let name = cli.host.clone().unwrap_or_else(|| config.host.name().to_string());
        let port = cli.port.unwrap_or(config.host.port());
        config.host = HostSettings::new(name, port);
    }

    observability::logging::init(&config.observability)?;
    tracing::info!("http-host v0.1.0 starting");
    tracing::info!(
        host = %config.host.name(),
        port = config.host.port(),
        request_timeout_secs = config.engine.request_timeout_secs,
        grace_period_secs = config.shutdown.grace_period_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let host = HttpHost::with_axum(config.settings(), config.engine.clone());

    let states = host.subscribe();
    host.register(
        "/health",
        respond(move |_req| {
            let state = *states.borrow();
            async move { Json(json!({ "state": state.as_str() })) }
        }),
    )?;
    host.register(
        "/",
        respond(|req: Request<Body>| async move {
            let id = req.request_id().unwrap_or("unknown").to_string();
            format!("http-host: {} (request {id})\n", req.uri().path())
        }),
    )?;

    let startup = CancellationToken::new();
    tokio::select! {
        started = host.start(&startup) => started?,
        _ = shutdown_signal() => {
            startup.cancel();
            tracing::info!("Shutdown requested during startup");
            return Ok(());
        }
    }

    shutdown_signal().await;

    let grace = Duration::from_secs(config.shutdown.grace_period_secs);
    host.stop_within(grace).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
