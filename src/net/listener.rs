//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve the configured port into a socket address
//! - Bind the listening socket before the server starts

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The configured port does not resolve to a socket address.
    #[error("Invalid listen address {port:?}: {source}")]
    Address {
        port: String,
        source: std::net::AddrParseError,
    },
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Bind a listener for the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr = config
        .listen_addr()
        .map_err(|source| ListenerError::Address {
            port: config.port.clone(),
            source,
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(
            address = %local_addr,
            max_concurrent_streams = config.max_concurrent_streams,
            "Listener bound"
        );
    }

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let config = ListenerConfig {
            port: "127.0.0.1:0".into(),
            ..Default::default()
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn rejects_unparseable_port() {
        let config = ListenerConfig {
            port: "http".into(),
            ..Default::default()
        };
        assert!(matches!(
            bind(&config).await,
            Err(ListenerError::Address { .. })
        ));
    }
}
