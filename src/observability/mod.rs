//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay sessions produce:
//!     → logging.rs (structured log events, connection_id on every line)
//!     → metrics.rs (session, bit and message counters)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Hidden message contents are never logged; only sizes are
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;
