//! Channel eligibility and ranking for a campaign.
//!
//! A channel is eligible when it is listed (active and verified), its floor
//! price does not exceed the campaign CPM, and it shares at least one
//! language and one category with the campaign's targeting. Eligible
//! channels are scored on a 0-100 scale and accepted greedily, best first,
//! while their estimated costs fit the campaign budget.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::adapter::outbound::sqlite::campaign::get_campaign;
use crate::adapter::outbound::sqlite::channel::listed_channels;
use crate::adapter::outbound::sqlite::Database;
use crate::domain::campaign::Campaign;
use crate::domain::channel::Channel;
use crate::domain::id::CampaignId;
use crate::domain::money::{round_money, Money};
use crate::domain::objective::round2;
use crate::error::Result;
use crate::infrastructure::config::matching::MatchingConfig;

const CATEGORY_WEIGHT: f64 = 25.0;
const LANGUAGE_WEIGHT: f64 = 10.0;
const REGION_POINTS: f64 = 10.0;
const CPM_POINTS: f64 = 15.0;
const BUDGET_POINTS: f64 = 10.0;
const REPUTATION_WEIGHT: f64 = 20.0;
const SUBSCRIBER_WEIGHT: f64 = 10.0;
/// log10 of the subscriber count at which the subscriber term saturates.
const SUBSCRIBER_CAP: f64 = 6.0;

/// A channel accepted by [`rank_channels`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChannel {
    pub channel: Channel,
    /// Match score, 0..=100.
    pub score: f64,
    pub estimated_cost: Money,
}

/// Cost of reaching `subscribers * engagement_rate` viewers at `cpm`.
#[must_use]
pub fn estimate_cost(subscribers: u64, engagement_rate: f64, cpm: Money) -> Money {
    let rate = Decimal::from_f64(engagement_rate).unwrap_or(Decimal::ZERO);
    let views = Decimal::from(subscribers) * rate;
    round_money(views / Decimal::ONE_THOUSAND * cpm)
}

fn overlap_ratio(targeted: &BTreeSet<String>, offered: &BTreeSet<String>) -> f64 {
    if targeted.is_empty() {
        return 0.0;
    }
    let shared = targeted.intersection(offered).count();
    shared as f64 / targeted.len() as f64
}

/// Whether `channel` may carry `campaign` at all.
#[must_use]
pub fn is_eligible(campaign: &Campaign, channel: &Channel) -> bool {
    let targeting = &campaign.targeting;
    channel.is_listed()
        && channel.min_cpm <= campaign.cpm
        && !targeting.languages.is_disjoint(&channel.languages)
        && !targeting.categories.is_disjoint(&channel.categories)
}

/// Match score of an eligible channel, rounded to two places.
#[must_use]
pub fn match_score(campaign: &Campaign, channel: &Channel, estimated_cost: Money) -> f64 {
    let targeting = &campaign.targeting;
    let mut score = overlap_ratio(&targeting.categories, &channel.categories) * CATEGORY_WEIGHT
        + overlap_ratio(&targeting.languages, &channel.languages) * LANGUAGE_WEIGHT;

    if targeting.regions.contains(&channel.region) {
        score += REGION_POINTS;
    }
    if campaign.cpm >= channel.min_cpm {
        score += CPM_POINTS;
    }
    if campaign.initial_budget >= estimated_cost {
        score += BUDGET_POINTS;
    }

    let reputation = (channel.rating() - channel.fraud_score()).max(0.0) / 5.0;
    score += reputation * REPUTATION_WEIGHT;

    let reach = ((channel.subscribers as f64) + 1.0).log10().min(SUBSCRIBER_CAP) / SUBSCRIBER_CAP;
    score += reach * SUBSCRIBER_WEIGHT;

    round2(score)
}

/// Rank `channels` for `campaign`.
///
/// Scores every eligible channel, orders them by score (stable, so equal
/// scores keep their input order), then accepts each whose estimated cost
/// still fits the budget alongside those already accepted, up to `top_n`.
#[must_use]
pub fn rank_channels(
    campaign: &Campaign,
    channels: Vec<Channel>,
    top_n: usize,
    fallback_engagement: f64,
) -> Vec<RankedChannel> {
    let mut scored: Vec<RankedChannel> = channels
        .into_iter()
        .filter(|channel| is_eligible(campaign, channel))
        .map(|channel| {
            let estimated_cost = estimate_cost(
                channel.subscribers,
                channel.engagement_rate(fallback_engagement),
                channel.min_cpm,
            );
            let score = match_score(campaign, &channel, estimated_cost);
            RankedChannel {
                channel,
                score,
                estimated_cost,
            }
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut selected = Vec::new();
    let mut committed = Decimal::ZERO;
    for candidate in scored {
        if selected.len() >= top_n {
            break;
        }
        if committed + candidate.estimated_cost <= campaign.initial_budget {
            committed += candidate.estimated_cost;
            selected.push(candidate);
        } else {
            debug!(
                campaign_id = %campaign.id,
                channel_id = %candidate.channel.id,
                cost = %candidate.estimated_cost,
                "Channel does not fit remaining budget"
            );
        }
    }
    selected
}

/// Ranks listed channels against stored campaigns.
#[derive(Clone)]
pub struct ChannelMatcher {
    db: Database,
    config: MatchingConfig,
}

impl ChannelMatcher {
    #[must_use]
    pub const fn new(db: Database, config: MatchingConfig) -> Self {
        Self { db, config }
    }

    /// Rank listed channels for a stored campaign, capped at `top_n` or the
    /// configured default.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`](crate::error::Error::NotFound) if the
    /// campaign does not exist.
    pub fn rank(&self, campaign: &CampaignId, top_n: Option<usize>) -> Result<Vec<RankedChannel>> {
        let mut conn = self.db.connection()?;
        let campaign = get_campaign(&mut conn, campaign)?;
        let channels = listed_channels(&mut conn)?;
        drop(conn);
        Ok(self.rank_campaign(&campaign, channels, top_n))
    }

    /// Rank `channels` for an already loaded campaign.
    #[must_use]
    pub fn rank_campaign(
        &self,
        campaign: &Campaign,
        channels: Vec<Channel>,
        top_n: Option<usize>,
    ) -> Vec<RankedChannel> {
        let considered = channels.len();
        let ranked = rank_channels(
            campaign,
            channels,
            top_n.unwrap_or(self.config.top_n),
            self.config.fallback_engagement,
        );
        info!(
            campaign_id = %campaign.id,
            considered,
            selected = ranked.len(),
            "Channels ranked"
        );
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::channel::{ChannelStatus, FALLBACK_ENGAGEMENT};
    use crate::testkit::domain::{campaign, channel, reputation, tags};
    use rust_decimal_macros::dec;

    fn rank(campaign: &Campaign, channels: Vec<Channel>) -> Vec<RankedChannel> {
        rank_channels(campaign, channels, 10, FALLBACK_ENGAGEMENT)
    }

    #[test]
    fn cost_uses_engagement_and_floor_price() {
        assert_eq!(estimate_cost(10_000, 0.15, dec!(5)), dec!(7.50));
        assert_eq!(estimate_cost(0, 0.15, dec!(5)), dec!(0));
    }

    #[test]
    fn eligibility_requires_shared_language_and_category() {
        let c = campaign("c1");
        let mut ch = channel("ch1", "o1");
        assert!(is_eligible(&c, &ch));

        ch.languages = tags(&["fr"]);
        assert!(!is_eligible(&c, &ch));

        let mut ch = channel("ch1", "o1");
        ch.categories = tags(&["sports"]);
        assert!(!is_eligible(&c, &ch));

        let mut ch = channel("ch1", "o1");
        ch.min_cpm = dec!(10.01);
        assert!(!is_eligible(&c, &ch));

        let mut ch = channel("ch1", "o1");
        ch.status = ChannelStatus::Pending;
        assert!(!is_eligible(&c, &ch));
    }

    #[test]
    fn full_match_scores_every_term() {
        let c = campaign("c1");
        let mut ch = channel("ch1", "o1");
        ch.subscribers = 999_999;
        ch.reputation = Some(reputation(5.0, 0.0, 0.2));
        // 25 + 10 + 10 + 15 + 10 + 20 + 10
        assert_eq!(match_score(&c, &ch, dec!(1)), 100.0);
    }

    #[test]
    fn partial_match_scores() {
        let mut c = campaign("c1");
        c.targeting.categories = tags(&["tech", "news"]);
        let mut ch = channel("ch1", "o1");
        ch.region = "DE".to_string();
        ch.subscribers = 999;
        ch.reputation = Some(reputation(4.0, 1.5, 0.2));
        // 12.5 + 10 + 0 + 15 + 10 + 10 + 5
        assert_eq!(match_score(&c, &ch, dec!(1)), 62.5);
    }

    #[test]
    fn greedy_selection_respects_budget() {
        let c = campaign("c1");

        // 120k * 0.5 / 1000 * 10 = 600, high score.
        let mut a = channel("a", "o1");
        a.min_cpm = dec!(10);
        a.subscribers = 120_000;
        a.reputation = Some(reputation(5.0, 0.0, 0.5));

        // 100k * 0.5 / 1000 * 10 = 500, lower score.
        let mut b = channel("b", "o2");
        b.min_cpm = dec!(10);
        b.subscribers = 100_000;
        b.reputation = Some(reputation(2.0, 0.0, 0.5));
        b.region = "DE".to_string();

        let ranked = rank(&c, vec![b, a]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].channel.id.as_str(), "a");
        assert_eq!(ranked[0].estimated_cost, dec!(600));
    }

    #[test]
    fn skips_unaffordable_but_keeps_looking() {
        let mut c = campaign("c1");
        c.initial_budget = dec!(100);

        let mut big = channel("big", "o1");
        big.subscribers = 999_999;
        let small = channel("small", "o2");

        let ranked = rank(&c, vec![big, small]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].channel.id.as_str(), "small");
    }

    #[test]
    fn caps_at_top_n() {
        let c = campaign("c1");
        let channels = (0..5).map(|i| channel(&format!("ch{i}"), "o")).collect();
        assert_eq!(rank_channels(&c, channels, 2, FALLBACK_ENGAGEMENT).len(), 2);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let c = campaign("c1");
        let ranked = rank(&c, vec![channel("x", "o1"), channel("y", "o2")]);
        let ids: Vec<_> = ranked.iter().map(|r| r.channel.id.as_str()).collect();
        assert_eq!(ids, ["x", "y"]);
    }
}
