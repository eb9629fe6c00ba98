//! HTTP/1.x message heads and bodies.
//!
//! # Responsibilities
//! - Split a message at the first blank line
//! - Parse the head into a start line and a [`HeaderBlock`]
//! - Serialize back to bytes without touching the start line or body
//!
//! # Design Decisions
//! - The start line is opaque; requests and responses share one type
//! - Bodies are passed through byte-for-byte

use crate::error::ProtocolError;
use crate::http::headers::HeaderBlock;

/// Separator between head and body.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// One request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage {
    /// Request line or status line, without CRLF.
    pub start_line: String,
    pub headers: HeaderBlock,
    pub body: Vec<u8>,
}

impl HttpMessage {
    /// Parse the head bytes (everything before the blank line).
    pub fn parse_head(head: &[u8]) -> Result<(String, HeaderBlock), ProtocolError> {
        let text = std::str::from_utf8(head).map_err(|_| ProtocolError::InvalidUtf8)?;
        let mut lines = text.split("\r\n");
        let start_line = lines.next().unwrap_or_default().to_string();
        let headers = HeaderBlock::parse(lines)?;
        Ok((start_line, headers))
    }

    /// Parse a complete message held in memory. Everything after the blank
    /// line is body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (head, body) = match find_head_end(bytes) {
            Some(end) => (&bytes[..end], &bytes[end + HEAD_TERMINATOR.len()..]),
            None => (bytes, &[][..]),
        };
        let (start_line, headers) = Self::parse_head(head)?;
        Ok(Self {
            start_line,
            headers,
            body: body.to_vec(),
        })
    }

    /// Declared body length, if any.
    pub fn content_length(headers: &HeaderBlock) -> Result<Option<usize>, ProtocolError> {
        headers
            .get("content-length")
            .map(|raw| {
                raw.parse::<usize>()
                    .map_err(|_| ProtocolError::InvalidContentLength(raw.to_string()))
            })
            .transpose()
    }

    /// Request method, taken from the first token of a request line.
    pub fn method(&self) -> &str {
        self.start_line.split(' ').next().unwrap_or_default()
    }

    /// Whether a message with this start line never carries a body, whatever
    /// its `Content-Length` says: 1xx, 204 and 304 responses.
    pub fn status_forbids_body(start_line: &str) -> bool {
        let mut parts = start_line.split(' ');
        let is_response = parts.next().is_some_and(|v| v.starts_with("HTTP/"));
        let status = parts.next().and_then(|code| code.parse::<u16>().ok());
        match status {
            Some(code) if is_response => (100..200).contains(&code) || code == 204 || code == 304,
            _ => false,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.start_line.len() + self.body.len() + 256);
        out.extend_from_slice(self.start_line.as_bytes());
        out.extend_from_slice(b"\r\n");
        self.headers.write_to(&mut out);
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

/// Offset of the first `\r\n\r\n`, if present.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}
