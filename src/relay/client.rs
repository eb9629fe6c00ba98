//! Browser-side relay session.
//!
//! # States
//! ```text
//! AwaitOperatorMessage
//!     → SendingOutbound: browser request → encode → upstream → one response back
//!     → AwaitingReply:   decode upstream responses until the reply terminator,
//!                        forwarding each one to the browser
//!     → Closed
//! ```
//!
//! While the outbound message is still in flight the server-side relay passes
//! destination responses through untouched, so those are relayed without
//! decoding.

use std::sync::Arc;
use tokio::net::TcpStream;

use crate::codec::{InboundMessage, OutboundMessage};
use crate::config::RelayConfig;
use crate::error::{Result, TransportError};
use crate::http::HttpMessage;
use crate::net::{ConnectionId, HttpConnection};
use crate::observability::metrics::{self, Direction};
use crate::operator::Operator;

pub struct ClientSession {
    id: ConnectionId,
    config: Arc<RelayConfig>,
    operator: Arc<dyn Operator>,
}

impl ClientSession {
    pub fn new(id: ConnectionId, config: Arc<RelayConfig>, operator: Arc<dyn Operator>) -> Self {
        Self {
            id,
            config,
            operator,
        }
    }

    /// Drive one browser connection until the hidden message is sent and the
    /// reply has arrived.
    pub async fn run(self, stream: TcpStream) -> Result<()> {
        let limits = &self.config.limits;
        let timeouts = &self.config.timeouts;
        let mut browser = HttpConnection::new(stream, limits.clone(), timeouts.clone());

        let message = self.operator.compose(self.id).await?;
        let mut outbound = OutboundMessage::new(&message);

        let peer = self.config.peer.address();
        let mut upstream = HttpConnection::connect(peer.as_str(), limits.clone(), timeouts.clone()).await?;
        tracing::info!(
            connection_id = %self.id,
            peer = %upstream.peer(),
            bits = outbound.total_bits(),
            "Connected to server relay"
        );

        loop {
            let Some(mut request) = browser.read_message().await? else {
                tracing::warn!(
                    connection_id = %self.id,
                    remaining_bits = outbound.remaining_bits(),
                    "Browser closed before hidden message was sent"
                );
                return Ok(());
            };

            let encoded = outbound.fill(&mut request.headers)?;
            metrics::record_bits(Direction::Sent, encoded.bits_written);
            tracing::debug!(
                connection_id = %self.id,
                bits = encoded.bits_written,
                remaining_bits = outbound.remaining_bits(),
                terminated = encoded.terminated,
                "Request carries covert bits"
            );

            if !outbound.is_complete() {
                self.operator
                    .awaiting_carrier(self.id, outbound.remaining_bits())
                    .await;
            }

            upstream.write_message(&request).await?;
            let method = request.method();

            if !outbound.is_complete() {
                let response = read_required(&mut upstream, method).await?;
                browser.write_message(&response).await?;
                continue;
            }

            metrics::record_hidden_message(Direction::Sent);
            self.receive_reply(&mut upstream, &mut browser, method).await?;
            break;
        }

        upstream.shutdown().await;
        browser.shutdown().await;
        Ok(())
    }

    /// Decode responses until the reply's terminator, relaying every one.
    /// Every reply carrier answers the request sent with `method`.
    async fn receive_reply(
        &self,
        upstream: &mut HttpConnection,
        browser: &mut HttpConnection,
        method: &str,
    ) -> Result<()> {
        let mut inbound = InboundMessage::new();

        loop {
            let response = read_required(upstream, method).await?;
            let reply = inbound.absorb(&response.headers);
            browser.write_message(&response).await?;

            match reply {
                Some(reply) => {
                    metrics::record_bits(Direction::Received, reply.len() * 8);
                    metrics::record_hidden_message(Direction::Received);
                    tracing::info!(
                        connection_id = %self.id,
                        bytes = reply.len(),
                        "Hidden reply received"
                    );
                    self.operator.deliver(self.id, &reply).await;
                    return Ok(());
                }
                None => tracing::debug!(
                    connection_id = %self.id,
                    bits = inbound.bits_received(),
                    carriers = inbound.carriers(),
                    "Reply incomplete"
                ),
            }
        }
    }
}

/// Read the response the protocol says must come for a request sent with
/// `method`.
pub(crate) async fn read_required(conn: &mut HttpConnection, method: &str) -> Result<HttpMessage> {
    conn.read_response(method)
        .await?
        .ok_or_else(|| TransportError::UnexpectedEof.into())
}
