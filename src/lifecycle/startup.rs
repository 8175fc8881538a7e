//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: failing to bind the listener is fatal
//! - The listener is bound before the server is built, so a bad port never
//!   leaves half-initialized background tasks behind

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Bind address did not parse.
    #[error("Invalid bind address '{address}': {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },
}

/// Bind the configured listening socket.
pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address: SocketAddr =
        config
            .bind_address
            .parse()
            .map_err(|source| StartupError::Address {
                address: config.bind_address.clone(),
                source,
            })?;

    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { address, source })?;
    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}
