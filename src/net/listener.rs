//! TCP listener implementation.
//!
//! # Responsibilities
//! - Bind to the configured port on all interfaces
//! - Apply address reuse and the configured backlog
//! - Accept incoming TCP connections

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Listening socket for one relay.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind `0.0.0.0:<port>` with the configured socket options.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address().parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        Self::bind_addr(addr, config).await
    }

    /// Bind an explicit address, e.g. loopback in tests.
    pub async fn bind_addr(addr: SocketAddr, config: &ListenerConfig) -> Result<Self, ListenerError> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ListenerError::Bind)?;

        socket
            .set_reuseaddr(config.reuse_address)
            .map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;
        let inner = socket.listen(config.backlog).map_err(ListenerError::Bind)?;

        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(peer_addr = %addr, "Connection accepted");
        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port_and_accepts() {
        let listener = Listener::bind_addr("127.0.0.1:0".parse().unwrap(), &ListenerConfig::default())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (_stream, peer) = listener.accept().await.unwrap();
        let client = client.await.unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
    }
}
