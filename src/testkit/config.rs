//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use rust_decimal::Decimal;

use crate::infrastructure::config::ledger::LedgerConfig;
use crate::infrastructure::config::matching::MatchingConfig;
use crate::infrastructure::config::metering::MeteringConfig;
use crate::infrastructure::config::settings::Config;

/// 15% platform fee, five reference attempts.
pub fn ledger() -> LedgerConfig {
    LedgerConfig::default()
}

/// Matching defaults with a custom activation floor.
pub fn matching(minimum_fund: Decimal) -> MatchingConfig {
    MatchingConfig {
        minimum_fund,
        ..MatchingConfig::default()
    }
}

/// One-second cadence so scheduler tests finish quickly.
pub fn metering(max_concurrent_campaigns: usize) -> MeteringConfig {
    MeteringConfig {
        interval_secs: 1,
        max_concurrent_campaigns,
    }
}

/// Full configuration pointing at an in-memory database.
pub fn in_memory() -> Config {
    let mut config = Config::default();
    config.database.url = ":memory:".to_string();
    config.database.pool_size = 1;
    config
}
