//! Framed HTTP message I/O over one TCP connection.
//!
//! # Responsibilities
//! - Read in chunks of at most `max_recv_size` bytes
//! - Cut one message at a time out of the read buffer
//! - Keep surplus bytes for the next message on the same connection
//! - Apply connect, read and write deadlines
//!
//! # Design Decisions
//! - `Content-Length` decides the body size when present, up to
//!   `max_body_bytes`
//! - Without it, the body is whatever arrived with the head
//! - 1xx, 204 and 304 responses, and responses to `HEAD`, have no body

use std::fmt::Display;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::config::{LimitsConfig, TimeoutConfig};
use crate::error::{ProtocolError, RelayError, TransportError};
use crate::http::message::{find_head_end, HEAD_TERMINATOR};
use crate::http::HttpMessage;
use crate::resilience::timeouts::with_deadline;

/// One side of a relayed HTTP exchange.
#[derive(Debug)]
pub struct HttpConnection {
    stream: TcpStream,
    peer: String,
    buffer: Vec<u8>,
    scratch: Vec<u8>,
    limits: LimitsConfig,
    timeouts: TimeoutConfig,
}

impl HttpConnection {
    /// Wrap an accepted stream.
    pub fn new(stream: TcpStream, limits: LimitsConfig, timeouts: TimeoutConfig) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            stream,
            peer,
            buffer: Vec::with_capacity(limits.max_recv_size),
            scratch: vec![0u8; limits.max_recv_size],
            limits,
            timeouts,
        }
    }

    /// Open a connection to `addr` within the connect deadline.
    pub async fn connect<A>(
        addr: A,
        limits: LimitsConfig,
        timeouts: TimeoutConfig,
    ) -> Result<Self, TransportError>
    where
        A: ToSocketAddrs + Display,
    {
        let label = addr.to_string();
        let stream = match tokio::time::timeout(timeouts.connect(), TcpStream::connect(addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TransportError::Connect {
                    addr: label,
                    source,
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    operation: "connect",
                    after: timeouts.connect(),
                })
            }
        };

        tracing::debug!(peer = %label, "Connected");
        Ok(Self::new(stream, limits, timeouts))
    }

    /// Remote address this connection talks to.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` when the peer closes cleanly between messages.
    pub async fn read_message(&mut self) -> Result<Option<HttpMessage>, RelayError> {
        self.read_framed(false).await
    }

    /// Read the response to a request sent with `request_method`. Responses
    /// to `HEAD` never carry a body.
    pub async fn read_response(
        &mut self,
        request_method: &str,
    ) -> Result<Option<HttpMessage>, RelayError> {
        self.read_framed(request_method.eq_ignore_ascii_case("HEAD"))
            .await
    }

    async fn read_framed(&mut self, head_only: bool) -> Result<Option<HttpMessage>, RelayError> {
        let head_end = loop {
            if let Some(end) = find_head_end(&self.buffer) {
                if end > self.limits.max_header_bytes {
                    return Err(self.head_too_large());
                }
                break end;
            }
            if self.buffer.len() > self.limits.max_header_bytes {
                return Err(self.head_too_large());
            }

            if self.fill_buffer().await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(TransportError::UnexpectedEof.into());
            }
        };

        let (start_line, headers) = HttpMessage::parse_head(&self.buffer[..head_end])?;
        let body_start = head_end + HEAD_TERMINATOR.len();

        let body_len = if head_only || HttpMessage::status_forbids_body(&start_line) {
            0
        } else {
            match HttpMessage::content_length(&headers)? {
                Some(len) => {
                    let limit = self.limits.max_body_bytes;
                    let end = body_start
                        .checked_add(len)
                        .filter(|_| len <= limit)
                        .ok_or(ProtocolError::BodyTooLarge { length: len, limit })?;
                    while self.buffer.len() < end {
                        if self.fill_buffer().await? == 0 {
                            return Err(TransportError::UnexpectedEof.into());
                        }
                    }
                    len
                }
                None => self.buffer.len() - body_start,
            }
        };

        let end = body_start + body_len;
        let body = self.buffer[body_start..end].to_vec();
        self.buffer.drain(..end);

        tracing::trace!(
            peer = %self.peer,
            start_line = %start_line,
            headers = headers.len(),
            body_len,
            "Message received"
        );

        Ok(Some(HttpMessage {
            start_line,
            headers,
            body,
        }))
    }

    pub async fn write_message(&mut self, message: &HttpMessage) -> Result<(), TransportError> {
        let bytes = message.to_bytes();
        with_deadline("write", self.timeouts.write(), self.stream.write_all(&bytes)).await?;
        tracing::trace!(peer = %self.peer, bytes = bytes.len(), "Message sent");
        Ok(())
    }

    /// Close the write half; errors are irrelevant at this point.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    async fn fill_buffer(&mut self) -> Result<usize, TransportError> {
        let n = with_deadline(
            "read",
            self.timeouts.read(),
            self.stream.read(&mut self.scratch),
        )
        .await?;
        self.buffer.extend_from_slice(&self.scratch[..n]);
        Ok(n)
    }

    fn head_too_large(&self) -> RelayError {
        ProtocolError::HeadTooLarge {
            limit: self.limits.max_header_bytes,
        }
        .into()
    }
}
