//! Operator interaction.
//!
//! The operator supplies hidden messages to send and reads the ones that
//! arrive. Relays only see the [`Operator`] trait; the terminal version lives
//! in `console.rs`.

pub mod console;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::net::ConnectionId;

pub use console::ConsoleOperator;

#[async_trait]
pub trait Operator: Send + Sync {
    /// Ask for the next hidden message to send on `session`.
    async fn compose(&self, session: ConnectionId) -> Result<Vec<u8>, RelayError>;

    /// Hand over a complete hidden message received on `session`.
    async fn deliver(&self, session: ConnectionId, message: &[u8]);

    /// The outbound message on `session` needs another carrier.
    async fn awaiting_carrier(&self, _session: ConnectionId, _remaining_bits: usize) {}
}
