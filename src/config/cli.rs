//! Command-line arguments.
//!
//! Every flag has an environment fallback and overrides the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{LogFormat, ServerConfig};
use crate::config::validation::validate_config;

#[derive(Debug, Default, Parser)]
#[command(name = "ext-proc-inspector")]
#[command(version, about = "Envoy external processor that logs traffic and inspects JSON bodies", long_about = None)]
pub struct Cli {
    /// Port or address to listen on ("8080", ":8080", "127.0.0.1:8080").
    #[arg(short, long, env = "PORT")]
    pub port: Option<String>,

    /// Maximum concurrent gRPC streams per connection.
    #[arg(short = 'c', long = "max-connections", env = "MAX_CONNECTIONS")]
    pub max_concurrent_streams: Option<u32>,

    /// Optional TOML configuration file.
    #[arg(long, env = "EXT_PROC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Grace period for in-flight streams on shutdown, in milliseconds.
    #[arg(long, env = "GRACE_PERIOD_MS")]
    pub grace_period_ms: Option<u64>,

    /// Log level or filter directive.
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then flags.
    pub fn load(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overlay the values given on the command line.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = &self.port {
            config.listener.port = port.clone();
        }
        if let Some(max) = self.max_concurrent_streams {
            config.listener.max_concurrent_streams = max;
        }
        if let Some(grace) = self.grace_period_ms {
            config.shutdown.grace_period_ms = grace;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(address) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "ext-proc-inspector",
            "-p",
            ":9000",
            "-c",
            "16",
            "--grace-period-ms",
            "0",
            "--log-format",
            "json",
            "--metrics-address",
            "127.0.0.1:9102",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.listener.port, ":9000");
        assert_eq!(config.listener.max_concurrent_streams, 16);
        assert_eq!(config.shutdown.grace_period_ms, 0);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.observability.metrics_enabled);
        assert_eq!(config.observability.metrics_address, "127.0.0.1:9102");
    }

    #[test]
    fn unset_flags_leave_config_alone() {
        let mut config = ServerConfig::default();
        config.listener.port = "1234".into();
        Cli::default().apply(&mut config);
        assert_eq!(config.listener.port, "1234");
        assert_eq!(config, {
            let mut expected = ServerConfig::default();
            expected.listener.port = "1234".into();
            expected
        });
    }

    #[test]
    fn invalid_override_fails_validation() {
        let cli = Cli {
            max_concurrent_streams: Some(0),
            ..Default::default()
        };
        assert!(matches!(cli.load(), Err(ConfigError::Validation(_))));
    }
}
