//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Listener.accept()
//!     → RelayServer spawns one task per connection
//!     → client.rs (browser side) or server.rs (destination side)
//!     → destination.rs (server role: Host header → socket address)
//! ```
//!
//! # Design Decisions
//! - Sessions share nothing but the read-only config and the operator
//! - A failing session is logged and dropped; the accept loop carries on
//! - Shutdown stops accepting; in-flight sessions are abandoned at exit

pub mod client;
pub mod destination;
pub mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::config::{RelayConfig, Role};
use crate::net::{ConnectionTracker, Listener};
use crate::observability::metrics;
use crate::operator::Operator;

pub use client::ClientSession;
pub use destination::Destination;
pub use server::ServerSession;

/// Accept loop for one relay role.
pub struct RelayServer {
    config: Arc<RelayConfig>,
    operator: Arc<dyn Operator>,
    tracker: ConnectionTracker,
}

impl RelayServer {
    pub fn new(config: RelayConfig, operator: Arc<dyn Operator>) -> Self {
        Self {
            config: Arc::new(config),
            operator,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Live session tracker, shared with spawned tasks.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(role = %self.config.role, "Relay accepting connections");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(
                        active_sessions = self.tracker.active_count(),
                        "Accept loop stopped"
                    );
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.spawn_session(stream, peer_addr),
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let guard = self.tracker.track();
        let config = Arc::clone(&self.config);
        let operator = Arc::clone(&self.operator);

        tokio::spawn(async move {
            let id = guard.id();
            let role = config.role;
            tracing::info!(connection_id = %id, peer_addr = %peer_addr, role = %role, "Session started");
            metrics::record_session_started(role.as_str());

            let result = match role {
                Role::Client => ClientSession::new(id, config, operator).run(stream).await,
                Role::Server => ServerSession::new(id, config, operator).run(stream).await,
            };

            match result {
                Ok(()) => {
                    tracing::info!(connection_id = %id, "Session closed");
                    metrics::record_session(role.as_str(), "ok");
                }
                Err(e) => {
                    tracing::error!(connection_id = %id, error = %e, "Session aborted");
                    metrics::record_session(role.as_str(), e.kind());
                }
            }
            drop(guard);
        });
    }
}
