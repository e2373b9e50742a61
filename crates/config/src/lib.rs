#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for bankr
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/bankr/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

mod sections;

pub use sections::{GeneralConfig, LimitsConfig};

use bankr_errors::{ConfigError, Error};
use bankr_types::{ColorChoice, OutputFormat, StateLimits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Largest process or resource count any configuration may allow
pub const HARD_LIMIT: usize = 64;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("bankr").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or declares limits outside `1..=HARD_LIMIT`.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // BANKR_OUTPUT
        if let Ok(output) = std::env::var("BANKR_OUTPUT") {
            self.general.default_output =
                output
                    .parse::<OutputFormat>()
                    .map_err(|value| ConfigError::InvalidValue {
                        field: "BANKR_OUTPUT".to_string(),
                        value,
                    })?;
        }

        // BANKR_COLOR
        if let Ok(color) = std::env::var("BANKR_COLOR") {
            self.general.color =
                color
                    .parse::<ColorChoice>()
                    .map_err(|value| ConfigError::InvalidValue {
                        field: "BANKR_COLOR".to_string(),
                        value,
                    })?;
        }

        // BANKR_MAX_PROCESSES
        if let Ok(max) = std::env::var("BANKR_MAX_PROCESSES") {
            self.limits.max_processes = max.parse().map_err(|_| ConfigError::InvalidValue {
                field: "BANKR_MAX_PROCESSES".to_string(),
                value: max,
            })?;
        }

        // BANKR_MAX_RESOURCES
        if let Ok(max) = std::env::var("BANKR_MAX_RESOURCES") {
            self.limits.max_resources = max.parse().map_err(|_| ConfigError::InvalidValue {
                field: "BANKR_MAX_RESOURCES".to_string(),
                value: max,
            })?;
        }

        self.validate()
    }

    /// Check that the configured limits are usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a limit is zero or above
    /// [`HARD_LIMIT`].
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in [
            ("limits.max_processes", self.limits.max_processes),
            ("limits.max_resources", self.limits.max_resources),
        ] {
            if value == 0 || value > HARD_LIMIT {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Snapshot limits derived from the `[limits]` section
    #[must_use]
    pub fn state_limits(&self) -> StateLimits {
        StateLimits::from(&self.limits)
    }
}
