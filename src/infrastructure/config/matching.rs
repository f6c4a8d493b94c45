//! Channel matching and activation configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::channel::FALLBACK_ENGAGEMENT;

/// Matching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    /// Maximum channels returned by a ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Escrowed budget a campaign must exceed before activation.
    #[serde(default = "default_minimum_fund")]
    pub minimum_fund: Decimal,
    /// Engagement rate assumed for channels without a usable reputation.
    #[serde(default = "default_fallback_engagement")]
    pub fallback_engagement: f64,
}

const fn default_top_n() -> usize {
    10
}

fn default_minimum_fund() -> Decimal {
    Decimal::from(100)
}

const fn default_fallback_engagement() -> f64 {
    FALLBACK_ENGAGEMENT
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            minimum_fund: default_minimum_fund(),
            fallback_engagement: default_fallback_engagement(),
        }
    }
}
