//! Configuration operator implementation.

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::operator::config::{ConfigView, ConfigurationOperator};

use super::entry::Operator;
use super::shared::open;

impl ConfigurationOperator for Operator {
    fn check_config(&self, path: &Path) -> Result<ConfigView> {
        let config = Config::load(path)?;
        Ok(ConfigView {
            database_url: config.database.url,
            pool_size: config.database.pool_size,
            platform_fee: config.ledger.platform_fee,
            reference_attempts: config.ledger.reference_attempts,
            top_n: config.matching.top_n,
            minimum_fund: config.matching.minimum_fund,
            interval_secs: config.metering.interval_secs,
            max_concurrent_campaigns: config.metering.max_concurrent_campaigns,
        })
    }

    fn migrate(&self, path: &Path) -> Result<String> {
        let (config, _db) = open(path)?;
        Ok(config.database.url)
    }
}
