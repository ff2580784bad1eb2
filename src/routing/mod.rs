//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! register(raw path, handler)            (any thread, before start)
//!     → path.rs (normalize to RouteKey)
//!     → registry.rs (append under the key, mutex-guarded)
//!
//! Route Table Compilation (once, at start):
//!     registry.seal()
//!     → snapshot ordered case-insensitively, then reversed
//!     → table.rs (flatten to (RouteKey, handler) pairs)
//!     → Freeze as immutable RouteTable handed to the engine
//! ```
//!
//! # Design Decisions
//! - Routes are frozen at start, immutable at runtime
//! - Prefix matching only, on segment boundaries, case-insensitive
//! - First match wins; larger keys are listed first so the root never
//!   shadows a specific prefix

pub mod path;
pub mod registry;
pub mod table;

pub use path::{normalize, RouteKey};
pub use registry::{EndpointRegistry, RegistrySnapshot};
pub use table::{RouteEntry, RouteTable};
