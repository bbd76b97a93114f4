//! Host resolution contract and default implementations.
//!
//! The engine treats resolution as an external collaborator: anything that
//! maps an inbound host to an ordered list of usable addresses can back it.
//! Callers use the first address only; an empty Ok result must be treated as
//! a failure before use.

use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

/// Host resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] std::io::Error),

    #[error("no address for host")]
    Empty,

    #[error("request carries no host")]
    MissingHost,

    #[error("unusable address: {0}")]
    BadAddress(String),
}

/// Maps a hostname to candidate upstream addresses, most-preferred first.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` (optionally `host:port`). An address in the result may
    /// carry a port; callers copy it into the outbound authority verbatim.
    async fn resolve(&self, host: &str) -> Result<Vec<String>, ResolveError>;
}

/// Fixed answer for every query. Used for configuration overrides and tests.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    addresses: Vec<String>,
}

impl StaticResolver {
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, _host: &str) -> Result<Vec<String>, ResolveError> {
        if self.addresses.is_empty() {
            return Err(ResolveError::Empty);
        }
        Ok(self.addresses.clone())
    }
}

/// System DNS through the runtime's resolver, with per-host overrides
/// consulted first.
#[derive(Debug, Clone, Default)]
pub struct SystemResolver {
    overrides: HashMap<String, Vec<String>>,
}

impl SystemResolver {
    pub fn new(overrides: HashMap<String, Vec<String>>) -> Self {
        Self { overrides }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<String>, ResolveError> {
        if let Some(fixed) = self.overrides.get(host) {
            if fixed.is_empty() {
                return Err(ResolveError::Empty);
            }
            return Ok(fixed.clone());
        }

        // An explicit inbound port is preserved in the results; without one
        // the addresses stay bare so the outbound scheme picks the port.
        let (name, port) = split_port(host);
        let lookup = format!("{}:{}", name, port.unwrap_or(0));
        let addresses: Vec<String> = tokio::net::lookup_host(lookup)
            .await?
            .map(|addr| format_address(addr, port.is_some()))
            .collect();

        if addresses.is_empty() {
            return Err(ResolveError::Empty);
        }
        Ok(addresses)
    }
}

/// Split a trailing `:port` off a host string, if present and numeric.
fn split_port(host: &str) -> (&str, Option<u16>) {
    if let Some((name, port)) = host.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return (name, Some(port));
        }
    }
    (host, None)
}

fn format_address(addr: SocketAddr, keep_port: bool) -> String {
    if keep_port {
        addr.to_string()
    } else {
        match addr {
            SocketAddr::V4(v4) => v4.ip().to_string(),
            SocketAddr::V6(v6) => format!("[{}]", v6.ip()),
        }
    }
}
