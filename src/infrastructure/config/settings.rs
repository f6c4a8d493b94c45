//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all engine settings.
//! Configuration is loaded from a TOML file; every section is optional and
//! falls back to its defaults. `ADZENGINE_DATABASE_URL` overrides the
//! database location.
//!
//! # Example
//!
//! ```no_run
//! use adzengine::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::ledger::LedgerConfig;
use super::logging::LoggingConfig;
use super::matching::MatchingConfig;
use super::metering::MeteringConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `[database] url`.
pub const DATABASE_URL_ENV: &str = "ADZENGINE_DATABASE_URL";

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, or `:memory:`.
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_database_url() -> String {
    "adzengine.db".to_string()
}

const fn default_pool_size() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_size: default_pool_size(),
        }
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Platform fee and reference generation.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Ranking and activation thresholds.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Metering cadence and parallelism.
    #[serde(default)]
    pub metering: MeteringConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.database.url = url;
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] or [`ConfigError::InvalidValue`]
    /// for the first offending setting.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let fee = self.ledger.platform_fee;
        if fee < Decimal::ZERO || fee >= Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "platform_fee",
                reason: "must be in [0, 1)".to_string(),
            }
            .into());
        }
        if self.ledger.reference_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reference_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.matching.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_n",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.matching.minimum_fund < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "minimum_fund",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if !(self.matching.fallback_engagement > 0.0 && self.matching.fallback_engagement <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "fallback_engagement",
                reason: "must be in (0, 1]".to_string(),
            }
            .into());
        }

        if self.metering.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.metering.max_concurrent_campaigns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_campaigns",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
