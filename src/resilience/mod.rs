//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Socket operation (connect, read, write):
//!     → timeouts.rs (enforce deadline)
//!     → On failure: error ends the owning session, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every socket call has a deadline
//! - No retries: a covert message must not be replayed into a second carrier

pub mod timeouts;
