//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.port {port:?} is not a valid port or address: {reason}")]
    InvalidPort { port: String, reason: String },

    #[error("listener.max_concurrent_streams must be greater than 0")]
    ZeroMaxStreams,

    #[error("observability.log_level {level:?} is not a valid filter: {reason}")]
    InvalidLogLevel { level: String, reason: String },

    #[error("observability.metrics_address {address:?} is not a valid socket address")]
    InvalidMetricsAddress { address: String },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.listen_addr() {
        errors.push(ValidationError::InvalidPort {
            port: config.listener.port.clone(),
            reason: e.to_string(),
        });
    }

    if config.listener.max_concurrent_streams == 0 {
        errors.push(ValidationError::ZeroMaxStreams);
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::InvalidLogLevel {
            level: config.observability.log_level.clone(),
            reason: e.to_string(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress {
            address: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
