//! Case relay
//!
//! Hides a short operator message in the upper/lower case of HTTP header
//! names while relaying ordinary browser traffic.
//!
//! # Architecture Overview
//!
//! ```text
//!   browser ──▶ client relay ──(re-cased requests)──▶ server relay ──▶ web server
//!   browser ◀── client relay ◀─(re-cased responses)── server relay ◀── web server
//!                    │                                     │
//!                 operator                              operator
//! ```
//!
//! The client relay hides its operator's message in the browser's requests.
//! The server relay decodes it, forwards each request to the host its `Host`
//! header names, then hides its own operator's reply in the responses.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use case_relay::config::{loader::read_config, validate_config, RelayConfig, Role};
use case_relay::lifecycle::{signals::trigger_on_interrupt, Shutdown};
use case_relay::net::Listener;
use case_relay::observability::{logging::init_logging, metrics::init_metrics};
use case_relay::operator::ConsoleOperator;
use case_relay::RelayServer;

#[derive(Debug, Parser)]
#[command(name = "case-relay", version, about = "Header-case covert channel relay")]
struct Cli {
    /// Which side of the channel to run
    #[arg(value_enum)]
    role: Role,

    /// Port to accept connections on
    listen_port: u16,

    /// Host of the other relay
    peer_host: String,

    /// Port of the other relay
    peer_port: u16,

    /// Optional TOML file with the remaining settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<RelayConfig, String> {
        let mut config = match &self.config {
            Some(path) => read_config(path).map_err(|e| e.to_string())?,
            None => RelayConfig::default(),
        };

        config.role = self.role;
        config.listener.port = self.listen_port;
        config.peer.host = self.peer_host;
        config.peer.port = self.peer_port;
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration:\n{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability.log_level);
    tracing::info!(role = %config.role, "case-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        listen_port = config.listener.port,
        peer = %config.peer.address(),
        max_recv_size = config.limits.max_recv_size,
        read_timeout_secs = config.timeouts.read_secs,
        "Configuration loaded"
    );

    let listener = match Listener::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Could not open listening socket");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    tokio::spawn(trigger_on_interrupt(shutdown.clone()));

    let server = RelayServer::new(config, Arc::new(ConsoleOperator::new()));
    server.run(listener, shutdown.subscribe()).await;

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
