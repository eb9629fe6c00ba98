//! OS signal handling.
//!
//! Ctrl-C (SIGINT) stops the accept loop. There is no reload signal: the
//! configuration is fixed for the life of the process.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl-C, then fire `shutdown`.
pub async fn trigger_on_interrupt(shutdown: Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Interrupt received, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
    }
    shutdown.trigger();
}
