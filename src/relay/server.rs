//! Destination-side relay session.
//!
//! # States
//! ```text
//! AwaitInbound:       upstream request → decode → forward to destination
//!                     → response back upstream untouched
//! AwaitOperatorReply: terminator seen → deliver message → prompt for reply
//! SendingOutbound:    the last destination response is re-sent upstream,
//!                     re-encoded each time, until the reply terminator is out
//! Closed
//! ```
//!
//! Requests go to the destination exactly as received, re-cased names
//! included.

use std::sync::Arc;
use tokio::net::TcpStream;

use crate::codec::{InboundMessage, OutboundMessage};
use crate::config::RelayConfig;
use crate::error::Result;
use crate::http::HttpMessage;
use crate::net::{ConnectionId, HttpConnection};
use crate::observability::metrics::{self, Direction};
use crate::operator::Operator;
use crate::relay::client::read_required;
use crate::relay::destination::Destination;

pub struct ServerSession {
    id: ConnectionId,
    config: Arc<RelayConfig>,
    operator: Arc<dyn Operator>,
}

impl ServerSession {
    pub fn new(id: ConnectionId, config: Arc<RelayConfig>, operator: Arc<dyn Operator>) -> Self {
        Self {
            id,
            config,
            operator,
        }
    }

    /// Drive one connection from the client-side relay.
    pub async fn run(self, stream: TcpStream) -> Result<()> {
        let mut upstream = HttpConnection::new(
            stream,
            self.config.limits.clone(),
            self.config.timeouts.clone(),
        );
        let mut inbound = InboundMessage::new();

        loop {
            let Some(request) = upstream.read_message().await? else {
                tracing::info!(
                    connection_id = %self.id,
                    bits = inbound.bits_received(),
                    "Client relay closed the connection"
                );
                return Ok(());
            };

            let hidden = inbound.absorb(&request.headers);
            let response = self.forward(&request).await?;

            let Some(hidden) = hidden else {
                tracing::debug!(
                    connection_id = %self.id,
                    bits = inbound.bits_received(),
                    carriers = inbound.carriers(),
                    "Hidden message incomplete"
                );
                upstream.write_message(&response).await?;
                continue;
            };

            metrics::record_bits(Direction::Received, hidden.len() * 8);
            metrics::record_hidden_message(Direction::Received);
            tracing::info!(
                connection_id = %self.id,
                bytes = hidden.len(),
                "Hidden message received"
            );
            self.operator.deliver(self.id, &hidden).await;

            let reply = self.operator.compose(self.id).await?;
            self.send_reply(&mut upstream, &response, &reply).await?;
            upstream.shutdown().await;
            return Ok(());
        }
    }

    /// Pass `request` to the host it names and return the response.
    async fn forward(&self, request: &HttpMessage) -> Result<HttpMessage> {
        let destination = Destination::from_headers(&request.headers)?;
        let addr = destination.resolve().await?;
        tracing::debug!(
            connection_id = %self.id,
            destination = %destination,
            addr = %addr,
            "Forwarding request"
        );

        let mut web = HttpConnection::connect(
            addr,
            self.config.limits.clone(),
            self.config.timeouts.clone(),
        )
        .await?;
        web.write_message(request).await?;
        let response = read_required(&mut web, request.method()).await?;
        web.shutdown().await;
        Ok(response)
    }

    /// Carry `reply` upstream in copies of `response` until it is complete.
    async fn send_reply(
        &self,
        upstream: &mut HttpConnection,
        response: &HttpMessage,
        reply: &[u8],
    ) -> Result<()> {
        let mut outbound = OutboundMessage::new(reply);
        let mut copies = 0usize;

        while !outbound.is_complete() {
            let mut carrier = response.clone();
            let encoded = outbound.fill(&mut carrier.headers)?;
            metrics::record_bits(Direction::Sent, encoded.bits_written);
            upstream.write_message(&carrier).await?;
            copies += 1;
        }

        metrics::record_hidden_message(Direction::Sent);
        tracing::info!(
            connection_id = %self.id,
            bits = outbound.total_bits(),
            copies,
            "Hidden reply sent"
        );
        Ok(())
    }
}
