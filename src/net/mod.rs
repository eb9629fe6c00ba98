//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → connection.rs (session id, live-session tracking)
//!     → transport.rs (framed HTTP message I/O with deadlines)
//!     → Hand off to a relay state machine
//! ```
//!
//! # Design Decisions
//! - One task per accepted connection, no pooling
//! - Every socket operation has a deadline

pub mod connection;
pub mod listener;
pub mod transport;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
pub use transport::HttpConnection;
