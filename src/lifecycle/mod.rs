//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (host.rs):
//!     NotStarted → Starting
//!     → seal registry → build route table
//!     → resolve host name → build engine (listen, map routes)
//!     → engine.start → Running            (any failure → Faulted)
//!
//! Stop (host.rs, shutdown.rs):
//!     Running → Stopping
//!     → trigger drain → wait for serve loops (bounded by token)
//!     → dispose engine → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller begins Stop
//! ```
//!
//! # Design Decisions
//! - One start per instance; Stopped and Faulted are terminal
//! - Stop is idempotent and never skips disposal
//! - Shutdown has a deadline: connections still open after it are closed
//!   forcibly

pub mod host;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use host::HttpHost;
pub use shutdown::{Drain, ShutdownSignal};
pub use state::HostLifecycleState;
