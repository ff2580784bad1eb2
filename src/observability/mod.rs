//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Host, registry and engine produce:
//!     → tracing events under an injected span (structured fields)
//!     → metrics.rs (counters, histograms)
//!
//! The binary installs the consumers:
//!     → logging.rs (fmt subscriber, pretty or JSON)
//!     → metrics.rs (Prometheus scrape endpoint, optional)
//! ```
//!
//! # Design Decisions
//! - Library code never installs a global subscriber or recorder
//! - Components take their span at construction instead of assuming one
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
