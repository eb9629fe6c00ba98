//! Covert channel codec.
//!
//! # Data Flow
//! ```text
//! Sending:
//!     hidden message bytes
//!     → bitstream.rs (MSB-first bits, consumed from the tail)
//!     → chunker.rs (one OutboundMessage per session direction)
//!     → case.rs encode (letter casing of header names, terminator)
//!
//! Receiving:
//!     carrier header block
//!     → case.rs decode (one bit per letter, stop at terminator)
//!     → chunker.rs (InboundMessage accumulates across carriers)
//!     → bitstream.rs (drop padding, reverse, pack bytes)
//! ```
//!
//! # Design Decisions
//! - Pure functions over header blocks; no I/O
//! - Stack ordering plus a compensating reversal keeps the wire format of
//!   existing relays

pub mod bitstream;
pub mod case;
pub mod chunker;

pub use bitstream::Bitstream;
pub use case::{Decoded, Encoded, TERMINATOR};
pub use chunker::{InboundMessage, OutboundMessage};
