//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the HTTP host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Host name and port to listen on.
    pub host: HostSettings,

    /// Engine (listener and middleware) settings.
    pub engine: EngineConfig,

    /// Stop behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl HostConfig {
    /// The immutable host settings handed to [`HttpHost`](crate::HttpHost).
    pub fn settings(&self) -> HostSettings {
        self.host.clone()
    }
}

/// Host name (or IP literal) and port the host binds.
///
/// Read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSettings {
    /// Host name, IP literal, or `*` for every IPv4 interface.
    name: String,

    /// TCP port; 0 binds an ephemeral port per address.
    port: u16,
}

impl HostSettings {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            name: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Request timeout (total time to produce a response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight requests may drain before being aborted, in seconds.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format (`pretty` or `json`).
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: HostConfig = toml::from_str("[host]\nport = 9000\n").unwrap();
        assert_eq!(config.host.name(), "127.0.0.1");
        assert_eq!(config.host.port(), 9000);
        assert_eq!(config.engine.request_timeout_secs, 30);
        assert_eq!(config.shutdown.grace_period_secs, 10);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_full_config() {
        let raw = r#"
            [host]
            name = "localhost"
            port = 8443

            [engine]
            request_timeout_secs = 5
            max_body_bytes = 1024

            [shutdown]
            grace_period_secs = 3

            [observability]
            log_level = "debug"
            log_format = "json"
            metrics_enabled = true
            metrics_address = "0.0.0.0:9100"
        "#;
        let config: HostConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.settings(), HostSettings::new("localhost", 8443));
        assert_eq!(config.engine.max_body_bytes, 1024);
        assert_eq!(config.shutdown.grace_period_secs, 3);
        assert_eq!(config.observability.log_format, "json");
    }
}
