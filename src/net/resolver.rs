//! Bind address resolution.
//!
//! # Responsibilities
//! - Turn the configured host name into an ordered list of IP addresses
//! - Keep the resolver swappable so tests can script results
//!
//! # Design Decisions
//! - IP literals never touch DNS
//! - `*` means every IPv4 interface (`0.0.0.0`)
//! - Duplicates are dropped, first occurrence wins
//! - An empty answer is an error, not an empty bind set

use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced while resolving bind addresses.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The system resolver failed.
    #[error("lookup of `{host}` failed: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// The lookup succeeded but yielded nothing bindable.
    #[error("`{0}` resolved to no addresses")]
    NoAddresses(String),
}

/// Resolves a host name to bindable network addresses.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Ordered, non-empty list of addresses for `host`.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Resolver backed by the system resolver via `tokio::net::lookup_host`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsResolver;

impl DnsResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AddressResolver for DnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let host = host.trim();
        if host == "*" {
            return Ok(vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED)]);
        }
        // Bracketed IPv6 literals are accepted as well.
        let literal = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = literal.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let resolved = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|source| ResolveError::Lookup {
                host: host.to_string(),
                source,
            })?;

        let addrs = dedup(resolved.map(|addr| addr.ip()));
        if addrs.is_empty() {
            return Err(ResolveError::NoAddresses(host.to_string()));
        }

        tracing::debug!(host = %host, addresses = ?addrs, "Host name resolved");
        Ok(addrs)
    }
}

/// Drop repeated addresses, keeping first-seen order.
pub fn dedup(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !out.contains(&addr) {
            out.push(addr);
        }
    }
    out
}
