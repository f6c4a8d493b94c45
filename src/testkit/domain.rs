//! Builders for domain entities used across tests.
//!
//! Every builder returns a valid, matchable entity: campaigns target
//! `en`/`tech`/`US`, channels are verified and speak `en`/`tech` in `US`.
//! Tests override the fields they care about.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::domain::campaign::{Ad, Campaign, CampaignStatus, Objective, Targeting};
use crate::domain::channel::{Channel, ChannelStatus, Reputation};
use crate::domain::id::{AdId, CampaignId, ChannelId, PlacementId, UserId};
use crate::domain::performance::DeliveryCounters;
use crate::domain::placement::{Placement, PlacementStatus};

/// Advertiser owning every built campaign.
pub const ADVERTISER: &str = "advertiser";

/// Set of string tags.
pub fn tags(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Active brand-awareness campaign, CPM 10, budget 1000.
pub fn campaign(id: &str) -> Campaign {
    Campaign {
        id: CampaignId::from(id),
        advertiser: UserId::from(ADVERTISER),
        name: format!("Campaign {id}"),
        objective: Objective::BrandAwareness,
        cpm: Decimal::from(10),
        initial_budget: Decimal::from(1000),
        total_spent: Decimal::ZERO,
        status: CampaignStatus::Active,
        targeting: Targeting {
            languages: tags(&["en"]),
            categories: tags(&["tech"]),
            regions: tags(&["US"]),
        },
        start_date: None,
        end_date: None,
    }
}

/// Active ad.
pub fn ad(id: &str, campaign: &str) -> Ad {
    Ad {
        id: AdId::from(id),
        campaign_id: CampaignId::from(campaign),
        headline: format!("Headline {id}"),
        body: format!("Body of {id}"),
        is_active: true,
    }
}

/// Verified auto-publishing channel, 10k subscribers, min CPM 5, no
/// reputation record.
pub fn channel(id: &str, owner: &str) -> Channel {
    Channel {
        id: ChannelId::from(id),
        owner: UserId::from(owner),
        title: format!("Channel {id}"),
        external_handle: format!("@{id}"),
        subscribers: 10_000,
        min_cpm: Decimal::from(5),
        auto_publish: true,
        status: ChannelStatus::Verified,
        is_active: true,
        region: "US".to_string(),
        languages: tags(&["en"]),
        categories: tags(&["tech"]),
        repost_preference: 3,
        reputation: None,
    }
}

/// Reputation record.
pub fn reputation(rating: f64, fraud_score: f64, avg_engagement_rate: f64) -> Reputation {
    Reputation {
        rating,
        fraud_score,
        avg_engagement_rate,
    }
}

/// Draft placement.
pub fn placement(id: &str, ad: &str, channel: &str, campaign: &str) -> Placement {
    Placement {
        id: PlacementId::from(id),
        ad_id: AdId::from(ad),
        channel_id: ChannelId::from(channel),
        campaign_id: CampaignId::from(campaign),
        status: PlacementStatus::Draft,
        preference_score: 0.0,
        winning_bid_price: Decimal::from(5),
        content_platform_id: None,
        repost_count: 0,
        max_reposts: 3,
    }
}

/// Snapshot with `impressions` and nothing else.
pub fn impressions(impressions: i64) -> DeliveryCounters {
    DeliveryCounters {
        impressions,
        ..DeliveryCounters::default()
    }
}
