//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → HostSettings to the host, EngineConfig to the engine factory
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the host is not reconfigurable
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{EngineConfig, HostConfig, HostSettings, ObservabilityConfig, ShutdownConfig};
pub use validation::{validate_config, ValidationError};
