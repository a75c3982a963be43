//! Configuration management for Stratus
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. Everything is validated once at setup;
//! nothing is re-validated per poll cycle.

use crate::error::{Result, StratusError};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Minimum poll interval accepted by validation, to respect upstream rate
/// limits.
pub const MIN_POLL_INTERVAL_SECONDS: u64 = 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cloud API endpoint configuration
    pub api: ApiConfig,

    /// Identity-provider overrides for the credential collaborator
    pub identity: IdentityConfig,

    /// Static bearer token for the out-of-the-box credential provider.
    /// The STRATUS_ACCESS_TOKEN environment variable takes precedence.
    pub access_token: String,

    /// Poll interval in seconds (minimum 60)
    pub poll_interval_seconds: u64,

    /// Meter-value trigger behavior
    pub meter: MeterConfig,

    /// Configuration-commit resolution behavior
    pub commit: CommitConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Cloud API endpoint parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the vendor end-user API
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// Identity-provider parameters (consumed by external credential flows)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// OAuth client id at the identity provider
    pub client_id: String,

    /// Identity-provider region
    pub region: String,
}

/// Meter-value trigger tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// How many times to re-read meter values after a trigger before giving
    /// up on a fresh Current.Offered measure
    pub trigger_poll_attempts: u32,

    /// Delay between trigger re-reads in milliseconds
    pub trigger_poll_delay_ms: u64,
}

/// Configuration-commit resolution tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// How many times to poll for a pending commit to settle
    pub poll_attempts: u32,

    /// Delay between commit status polls in milliseconds
    pub poll_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Max log file size in MB
    pub max_file_size_mb: u32,

    /// Number of backup files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "stratus_config.yaml",
            "/data/stratus_config.yaml",
            "/etc/stratus/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(StratusError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(StratusError::validation(
                "api.base_url",
                "Base URL must use an http(s) scheme",
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(StratusError::validation(
                "api.timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if self.poll_interval_seconds < MIN_POLL_INTERVAL_SECONDS {
            return Err(StratusError::validation(
                "poll_interval_seconds",
                "Must be at least 60 to respect upstream rate limits",
            ));
        }

        if self.identity.client_id.is_empty() {
            return Err(StratusError::validation(
                "identity.client_id",
                "Client id cannot be empty",
            ));
        }

        if self.meter.trigger_poll_attempts == 0 {
            return Err(StratusError::validation(
                "meter.trigger_poll_attempts",
                "Must be greater than 0",
            ));
        }

        if self.commit.poll_attempts == 0 {
            return Err(StratusError::validation(
                "commit.poll_attempts",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval_seconds, 900);
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.api.base_url.starts_with("https://"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Empty base URL
        config.api.base_url = String::new();
        assert!(config.validate().is_err());

        // Non-http scheme
        config = Config::default();
        config.api.base_url = "ftp://somewhere".to_string();
        assert!(config.validate().is_err());

        // Sub-minimum poll interval
        config = Config::default();
        config.poll_interval_seconds = 30;
        assert!(config.validate().is_err());

        config.poll_interval_seconds = MIN_POLL_INTERVAL_SECONDS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.api.base_url, deserialized.api.base_url);
        assert_eq!(
            config.poll_interval_seconds,
            deserialized.poll_interval_seconds
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("poll_interval_seconds: 600\n").unwrap();
        assert_eq!(config.poll_interval_seconds, 600);
        assert_eq!(config.meter.trigger_poll_attempts, 10);
        assert_eq!(config.identity.region, "eu-west-1");
    }
}
