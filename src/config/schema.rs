//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which end of the covert channel this process plays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sits between the browser and the server-side relay.
    #[default]
    Client,
    /// Sits between the client-side relay and destination web servers.
    Server,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for a relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay role.
    pub role: Role,

    /// Listening socket.
    pub listener: ListenerConfig,

    /// The other relay (upstream for the client role).
    pub peer: PeerConfig,

    /// Read sizes and head limits.
    pub limits: LimitsConfig,

    /// Socket deadlines.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port bound on all interfaces.
    pub port: u16,

    /// Pending connection backlog.
    pub backlog: u32,

    /// Set `SO_REUSEADDR` before binding.
    pub reuse_address: bool,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backlog: 1,
            reuse_address: true,
        }
    }
}

/// Address of the other relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerConfig {
    pub host: String,
    pub port: u16,
}

impl PeerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
        }
    }
}

/// Buffer limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum bytes taken from a socket per read.
    pub max_recv_size: usize,

    /// Maximum size of a message head (start line plus headers).
    pub max_header_bytes: usize,

    /// Largest `Content-Length` a peer may declare.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_recv_size: 4096,
            max_header_bytes: 4096,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Timeout configuration for socket operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Longest wait for the next message on a connection, in seconds.
    pub read_secs: u64,

    /// Write timeout in seconds.
    pub write_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            read_secs: 300,
            write_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
