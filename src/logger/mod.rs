//! Logger module
//!
//! Named log events for the server and the serving pipeline, emitted through
//! `tracing`. Library code only emits; the binary installs the subscriber
//! with [`init`].

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup. `RUST_LOG` overrides the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        %addr,
        root = %config.server.root,
        level = %config.logging.level,
        workers = ?config.server.workers,
        "server started"
    );
}

pub fn log_request(method: &hyper::Method, path: &str, status: u16, client: &str) {
    tracing::info!(%method, path, status, client, "request");
}

pub fn log_encode_failed(name: &str, err: &crate::error::EncodeError) {
    tracing::error!(name, err = %err, "failed to encode");
}

pub fn log_inefficient_compression(name: &str, content_type: &str, raw: usize, encoded: usize) {
    tracing::warn!(name, content_type, raw, encoded, "inefficient compression");
}

pub fn log_open_failed(err: &crate::error::ServeError) {
    tracing::debug!(err = %err, "entry not found");
}

pub fn log_read_failed(err: &crate::error::ServeError) {
    tracing::error!(err = %err, "failed to read file");
}

pub fn log_accept_failed(err: &std::io::Error) {
    tracing::error!(err = %err, "failed to accept connection");
}

pub fn log_connection_timeout(peer: &SocketAddr, secs: u64) {
    tracing::warn!(%peer, secs, "connection timed out");
}

pub fn log_shutdown() {
    tracing::info!("shutdown signal received, no longer accepting connections");
}

pub fn log_connection_error(err: &hyper::Error) {
    tracing::error!(err = %err, "failed to serve connection");
}

/// Client went away mid-response; not an application error
pub fn log_peer_gone(peer: &SocketAddr, err: &hyper::Error) {
    tracing::debug!(%peer, err = %err, "peer gone");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}
