//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Validate → Init logging/metrics → Bind listener
//!
//! Shutdown:
//!     signals.rs (Ctrl-C) → shutdown.rs broadcast → accept loop returns
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
