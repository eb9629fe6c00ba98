//! Destination lookup from the `Host` header.
//!
//! # Design Decisions
//! - Header name match is case-insensitive (names arrive re-cased)
//! - `host` alone means port 80; `host:port` and `[v6]:port` are accepted
//! - The value is trimmed, which also drops a trailing terminator marker

use std::net::SocketAddr;

use crate::error::{ProtocolError, RelayError, Result};
use crate::http::HeaderBlock;

pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Host name and port a request is meant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    /// Read the destination from a request's headers.
    pub fn from_headers(headers: &HeaderBlock) -> std::result::Result<Self, ProtocolError> {
        let value = headers.get("host").ok_or(ProtocolError::MissingHost)?;
        Self::parse(value)
    }

    /// Parse a `Host` header value.
    pub fn parse(value: &str) -> std::result::Result<Self, ProtocolError> {
        let value = value.trim();
        let invalid = || ProtocolError::InvalidHost(value.to_string());

        let (host, port) = if let Some(rest) = value.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if after.is_empty() => (host, None),
                None => return Err(invalid()),
            }
        } else {
            match value.split_once(':') {
                Some((host, port)) if !port.contains(':') => (host, Some(port)),
                Some(_) => return Err(invalid()),
                None => (value, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None => DEFAULT_HTTP_PORT,
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Resolve to the first socket address the resolver returns.
    pub async fn resolve(&self) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| RelayError::Resolve {
                host: self.host.clone(),
                port: self.port,
                source: Some(e),
            })?;

        addrs.next().ok_or_else(|| RelayError::Resolve {
            host: self.host.clone(),
            port: self.port,
            source: None,
        })
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
