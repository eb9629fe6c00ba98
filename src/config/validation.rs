//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, buffer sizes, timeouts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::RelayConfig;

/// Smallest head limit that still fits a request line and a Host header.
const MIN_HEADER_BYTES: usize = 64;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.backlog == 0 {
        errors.push(ValidationError::new("listener.backlog", "must be at least 1"));
    }

    if config.peer.host.trim().is_empty() {
        errors.push(ValidationError::new("peer.host", "must not be empty"));
    }
    if config.peer.port == 0 {
        errors.push(ValidationError::new("peer.port", "must be non-zero"));
    }

    if config.limits.max_recv_size == 0 {
        errors.push(ValidationError::new("limits.max_recv_size", "must be non-zero"));
    }
    if config.limits.max_header_bytes < MIN_HEADER_BYTES {
        errors.push(ValidationError::new(
            "limits.max_header_bytes",
            format!("must be at least {}", MIN_HEADER_BYTES),
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be non-zero"));
    }

    for (field, secs) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.read_secs", config.timeouts.read_secs),
        ("timeouts.write_secs", config.timeouts.write_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be non-zero"));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
