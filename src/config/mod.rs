//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (role, ports, peer)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with every session task
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, ObservabilityConfig, PeerConfig, RelayConfig, Role,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
