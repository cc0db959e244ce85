//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the processor.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (port, stream limit).
    pub listener: ListenerConfig,

    /// Shutdown behavior.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port to listen on: `"8080"`, `":8080"` or a full `"host:port"`.
    pub port: String,

    /// Maximum concurrent gRPC streams per connection.
    pub max_concurrent_streams: u32,
}

impl ListenerConfig {
    /// Resolve `port` into the socket address to bind.
    ///
    /// A bare port or `:port` binds every interface.
    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let port = self.port.trim();
        if let Ok(port) = port.parse::<u16>() {
            return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
        }
        if let Some(port) = port.strip_prefix(':') {
            return format!("0.0.0.0:{}", port).parse();
        }
        port.parse()
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
            max_concurrent_streams: 100,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight streams get to finish after a shutdown signal.
    pub grace_period_ms: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 1000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(port: &str) -> ListenerConfig {
        ListenerConfig {
            port: port.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn bare_port_binds_all_interfaces() {
        assert_eq!(
            listener("8080").listen_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            listener(":9001").listen_addr().unwrap(),
            "0.0.0.0:9001".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn full_address_is_kept() {
        assert_eq!(
            listener("127.0.0.1:50051").listen_addr().unwrap(),
            "127.0.0.1:50051".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            listener("[::1]:50051").listen_addr().unwrap(),
            "[::1]:50051".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn garbage_port_is_rejected() {
        assert!(listener("eighty").listen_addr().is_err());
        assert!(listener(":99999").listen_addr().is_err());
        assert!(listener("").listen_addr().is_err());
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listener.port, "8080");
        assert_eq!(config.listener.max_concurrent_streams, 100);
        assert_eq!(config.shutdown.grace_period(), Duration::from_secs(1));
        assert!(!config.observability.metrics_enabled);
    }
}
