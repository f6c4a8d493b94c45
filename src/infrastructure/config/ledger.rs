//! Ledger configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Fraction of every metered amount withheld by the platform (0.15 = 15%).
    #[serde(default = "default_platform_fee")]
    pub platform_fee: Decimal,
    /// Reference generation attempts before giving up.
    #[serde(default = "default_reference_attempts")]
    pub reference_attempts: u32,
}

fn default_platform_fee() -> Decimal {
    Decimal::new(15, 2)
}

const fn default_reference_attempts() -> u32 {
    5
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            platform_fee: default_platform_fee(),
            reference_attempts: default_reference_attempts(),
        }
    }
}
