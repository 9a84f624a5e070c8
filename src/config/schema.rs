//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Everything except the announced client endpoint has a documented default.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::proxy_protocol::ClientEndpoint;

/// Root configuration for a PROXY protocol HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Endpoint announced as the PROXY source. Required.
    pub client: ClientEndpointConfig,

    /// Dialing and connection pool settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// Config announcing `ip:port` with default transport settings.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            client: ClientEndpointConfig { ip, port },
            transport: TransportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// The upstream client being relayed on behalf of.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientEndpointConfig {
    /// IP announced as the PROXY source address.
    pub ip: IpAddr,

    /// Port announced as the PROXY source port.
    pub port: u16,
}

impl From<ClientEndpointConfig> for ClientEndpoint {
    fn from(config: ClientEndpointConfig) -> Self {
        ClientEndpoint::new(config.ip, config.port)
    }
}

/// Dialer and pool settings.
///
/// Defaults:
/// - dial timeout 30s
/// - TCP keep-alive 30s
/// - 100 idle connections kept per host
/// - idle connections dropped after 90s
/// - PROXY header write bounded to 10s
/// - HTTP/1.1 over plaintext, HTTP/2 when negotiated by an outer TLS layer
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// TCP keep-alive interval in seconds.
    pub keepalive_secs: u64,

    /// Maximum idle pooled connections per host.
    pub max_idle_per_host: usize,

    /// Idle pooled connection timeout in seconds.
    pub idle_timeout_secs: u64,

    /// Upper bound on writing the PROXY header, in seconds.
    pub header_write_timeout_secs: u64,

    /// Speak HTTP/2 with prior knowledge instead of HTTP/1.1.
    pub http2_only: bool,
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn header_write_timeout(&self) -> Duration {
        Duration::from_secs(self.header_write_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            keepalive_secs: 30,
            max_idle_per_host: 100,
            idle_timeout_secs: 90,
            header_write_timeout_secs: 10,
            http2_only: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
