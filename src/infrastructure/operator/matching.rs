//! Matching operator implementation.

use std::path::Path;

use crate::application::matcher::ChannelMatcher;
use crate::domain::id::CampaignId;
use crate::error::Result;
use crate::port::inbound::operator::matching::{MatchingOperator, RankedChannelView};

use super::entry::Operator;
use super::shared::open;

impl MatchingOperator for Operator {
    fn rank(
        &self,
        path: &Path,
        campaign: &str,
        top_n: Option<usize>,
    ) -> Result<Vec<RankedChannelView>> {
        let (config, db) = open(path)?;
        let matcher = ChannelMatcher::new(db, config.matching);
        let ranked = matcher.rank(&CampaignId::from(campaign), top_n)?;
        Ok(ranked
            .into_iter()
            .map(|r| RankedChannelView {
                channel_id: r.channel.id.to_string(),
                title: r.channel.title,
                subscribers: r.channel.subscribers,
                score: r.score,
                estimated_cost: r.estimated_cost,
            })
            .collect())
    }
}
