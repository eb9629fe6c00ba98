//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Let `RUST_LOG` override the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a configured level, scoped to this crate.
pub fn default_filter(level: &str) -> String {
    format!("case_relay={}", level)
}

/// Install the global subscriber.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
