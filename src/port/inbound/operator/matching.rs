//! Channel ranking projection for operator-facing adapters.

use std::path::Path;

use crate::domain::money::Money;
use crate::error::Result;

/// One shortlisted channel.
#[derive(Debug, Clone)]
pub struct RankedChannelView {
    pub channel_id: String,
    pub title: String,
    pub subscribers: u64,
    pub score: f64,
    pub estimated_cost: Money,
}

/// Matching use-cases.
pub trait MatchingOperator {
    /// Rank listed channels for a stored campaign.
    ///
    /// # Errors
    /// Returns an error if the campaign does not exist.
    fn rank(&self, path: &Path, campaign: &str, top_n: Option<usize>)
        -> Result<Vec<RankedChannelView>>;
}
