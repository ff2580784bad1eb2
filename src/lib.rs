//! Single-process HTTP host.
//!
//! Owns the lifecycle of one embedded HTTP engine and multiplexes
//! path-scoped handlers onto it. Handlers are registered before start,
//! frozen into a first-match route table at start, and served until stop.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::{HostConfig, HostSettings};
pub use error::{HostError, HostResult, LifecycleViolation};
pub use http::{respond, Handler, Outcome};
pub use lifecycle::{HostLifecycleState, HttpHost};
pub use routing::RouteKey;
