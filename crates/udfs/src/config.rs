//! Configuration loading and validation for the UDF server.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is present but invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the invocation endpoint listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP endpoint for span export. Unset or blank disables export.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Endpoint override for the Secrets Manager client. Unset or blank uses
    /// the SDK's regional endpoint.
    #[serde(default)]
    pub secrets_manager_endpoint: Option<String>,

    /// Largest number of rows accepted in one invocation.
    #[serde(default = "default_max_batch_rows")]
    pub max_batch_rows: usize,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}
fn default_max_batch_rows() -> usize {
    10_000
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The OTLP endpoint, if one is configured.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        non_blank(&self.otel_exporter_otlp_endpoint)
    }

    /// The Secrets Manager endpoint override, if one is configured.
    pub fn secrets_manager_endpoint(&self) -> Option<&str> {
        non_blank(&self.secrets_manager_endpoint)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        if self.max_batch_rows == 0 {
            anyhow::bail!("MAX_BATCH_ROWS must be > 0");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            listen_port: default_listen_port(),
            log_level: default_log_level(),
            otel_exporter_otlp_endpoint: None,
            secrets_manager_endpoint: None,
            max_batch_rows: default_max_batch_rows(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_max_batch_rows(), 10_000);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_port() {
        let cfg = Config {
            listen_port: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let cfg = Config {
            max_batch_rows: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_endpoints_are_disabled() {
        let cfg = Config {
            otel_exporter_otlp_endpoint: Some("   ".into()),
            secrets_manager_endpoint: Some(" http://localhost:4566 ".into()),
            ..valid()
        };
        assert_eq!(cfg.otlp_endpoint(), None);
        assert_eq!(
            cfg.secrets_manager_endpoint(),
            Some("http://localhost:4566")
        );
    }
}
