//! Metering schedule configuration.

use std::time::Duration;

use serde::Deserialize;

/// Metering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MeteringConfig {
    /// Seconds between metering cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Campaigns metered concurrently within one cycle.
    #[serde(default = "default_max_concurrent_campaigns")]
    pub max_concurrent_campaigns: usize,
}

const fn default_interval_secs() -> u64 {
    3600
}

const fn default_max_concurrent_campaigns() -> usize {
    4
}

impl MeteringConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrent_campaigns: default_max_concurrent_campaigns(),
        }
    }
}
