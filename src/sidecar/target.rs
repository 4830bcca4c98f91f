//! Sidecar target resolution
//!
//! Decides, from the configured base URL, whether the AI service is local
//! (and therefore supervisable) or remote. Resolution happens once at
//! startup; the result is immutable afterwards.

use std::net::{Ipv4Addr, Ipv6Addr};

use reqwest::Url;
use tracing::warn;

/// Resolved address of the AI inference sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarTarget {
    /// Hostname or IP literal of the service.
    pub host: String,
    /// TCP port of the service.
    pub port: u16,
    /// True iff `host` is a loopback address, which makes the service
    /// eligible for local process management.
    pub is_local: bool,
    base_url: String,
}

impl SidecarTarget {
    /// Resolve a configured base URL into a target.
    ///
    /// Malformed input yields a non-local target: the supervisor must never
    /// attempt to spawn a process for an address it cannot prove local, so
    /// unparseable is treated the same as remote. The raw value is still
    /// kept as the probe base URL so health checks report the real failure.
    pub fn resolve(base_url: &str) -> Self {
        let trimmed = base_url.trim_end_matches('/');

        match Url::parse(trimmed) {
            Ok(url) => {
                let host = url.host_str().unwrap_or_default().to_string();
                let port = url.port_or_known_default().unwrap_or(80);
                let is_local = is_loopback_host(&host);
                Self {
                    host,
                    port,
                    is_local,
                    base_url: trimmed.to_string(),
                }
            }
            Err(err) => {
                warn!(
                    url = %trimmed,
                    error = %err,
                    "AI service URL is malformed; treating target as non-local"
                );
                Self {
                    host: trimmed.to_string(),
                    port: 80,
                    is_local: false,
                    base_url: trimmed.to_string(),
                }
            }
        }
    }

    /// Base URL for outbound requests, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a target directly from parts (tests and unusual deployments).
    pub fn from_parts(host: &str, port: u16, is_local: bool) -> Self {
        Self {
            host: host.to_string(),
            port,
            is_local,
            base_url: format!("http://{}:{}", host, port),
        }
    }
}

/// Whether a hostname refers to this host.
///
/// `localhost`, any `127.0.0.0/8` IPv4 literal, and IPv6 `::1` count as
/// local. Other private ranges do not: an address on the same LAN is not
/// this machine, and spawning a process can never make it reachable.
fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return addr.is_loopback();
    }
    // URL parsing strips the brackets from IPv6 literals, but accept both.
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(addr) = bare.parse::<Ipv6Addr>() {
        return addr.is_loopback();
    }
    false
}
