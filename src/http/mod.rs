//! HTTP/1.x framing subsystem.
//!
//! # Data Flow
//! ```text
//! bytes from a socket
//!     → message.rs (split head/body, parse start line)
//!     → headers.rs (ordered, lossless header block)
//!     → [codec rewrites name casing]
//!     → message.rs (serialize)
//!     → bytes to the next hop
//! ```

pub mod headers;
pub mod message;

pub use headers::{HeaderBlock, HeaderField};
pub use message::HttpMessage;
