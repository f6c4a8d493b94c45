//! Configuration projections for operator-facing adapters.

use std::path::Path;

use rust_decimal::Decimal;

use crate::error::Result;

/// Effective configuration, flattened for display.
#[derive(Debug, Clone)]
pub struct ConfigView {
    pub database_url: String,
    pub pool_size: u32,
    pub platform_fee: Decimal,
    pub reference_attempts: u32,
    pub top_n: usize,
    pub minimum_fund: Decimal,
    pub interval_secs: u64,
    pub max_concurrent_campaigns: usize,
}

/// Configuration and schema use-cases.
pub trait ConfigurationOperator {
    /// Load and validate the config file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    fn check_config(&self, path: &Path) -> Result<ConfigView>;

    /// Open the configured database, applying pending migrations. Returns
    /// the database location.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or migrations fail.
    fn migrate(&self, path: &Path) -> Result<String>;
}
