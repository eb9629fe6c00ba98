//! Error taxonomy for relay sessions.
//!
//! Transport and protocol errors end the session that raised them. Nothing in
//! here is fatal to the accept loop.

use std::time::Duration;
use thiserror::Error;

/// Result alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Socket-level failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not open a connection to a peer.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A socket operation missed its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Peer closed the connection in the middle of a message.
    #[error("connection closed mid-message")]
    UnexpectedEof,
}

/// HTTP framing and covert-channel protocol failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Head exceeded the configured limit without a blank-line separator.
    #[error("message head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    /// Declared `Content-Length` exceeds the configured body limit.
    #[error("declared body of {length} bytes exceeds {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    /// Head bytes are not valid UTF-8.
    #[error("message head is not valid UTF-8")]
    InvalidUtf8,

    /// A header line has no `:` separator.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// `Content-Length` could not be parsed.
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// Request carries no `Host` header.
    #[error("cannot determine intended host")]
    MissingHost,

    /// `Host` header value is not `host` or `host:port`.
    #[error("invalid Host header: {0:?}")]
    InvalidHost(String),

    /// A carrier message could not take any of the pending bits.
    #[error("carrier has no room for covert bits ({remaining} bits pending)")]
    NoCarrierCapacity { remaining: usize },
}

/// Umbrella error for a relay session.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Destination name lookup failed or returned nothing.
    #[error("cannot resolve destination {host}:{port}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The operator input is gone (terminal closed).
    #[error("operator input closed")]
    OperatorClosed,
}

impl RelayError {
    /// Short label used for the session outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "transport",
            RelayError::Protocol(_) => "protocol",
            RelayError::Resolve { .. } => "resolve",
            RelayError::OperatorClosed => "operator",
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::Transport(TransportError::Io(err))
    }
}
