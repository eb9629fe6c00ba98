//! Covert messaging carried in the letter case of HTTP header names.

pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod operator;
pub mod relay;
pub mod resilience;

pub use config::schema::RelayConfig;
pub use error::{RelayError, Result};
pub use lifecycle::Shutdown;
pub use operator::Operator;
pub use relay::RelayServer;
