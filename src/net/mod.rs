//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! HostSettings.host_name
//!     → resolver.rs (IP literal, "*", or system lookup)
//!     → [IpAddr] × HostSettings.port
//!     → listener.rs (bind each endpoint, all-or-nothing)
//!     → Hand listeners to the engine
//! ```
//!
//! # Design Decisions
//! - Resolution is a trait so the lifecycle can be tested without DNS
//! - A partial bind never survives: bound sockets are dropped on failure

pub mod listener;
pub mod resolver;

pub use listener::{bind_all, BoundListener, ListenerError};
pub use resolver::{AddressResolver, DnsResolver, ResolveError};
