//! Content channels and their reputation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ChannelId, UserId};
use super::money::Money;

/// Rating assumed when a channel has no reputation record.
pub const DEFAULT_RATING: f64 = 5.0;
/// Fraud score assumed when a channel has no reputation record.
pub const DEFAULT_FRAUD_SCORE: f64 = 0.0;
/// Engagement rate assumed when none has been observed.
pub const FALLBACK_ENGAGEMENT: f64 = 0.15;

/// Channel verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Pending,
    InReview,
    Verified,
    Rejected,
    Deleted,
}

impl ChannelStatus {
    /// Stable name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => Self::Pending,
            "in_review" => Self::InReview,
            "verified" => Self::Verified,
            "rejected" => Self::Rejected,
            "deleted" => Self::Deleted,
            other => {
                return Err(DomainError::UnknownStatus {
                    kind: "channel",
                    value: other.to_string(),
                })
            }
        })
    }
}

/// Static reputation attributes, owned 1:1 by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub rating: f64,
    pub fraud_score: f64,
    /// Observed fraction of subscribers that view a post.
    pub avg_engagement_rate: f64,
}

impl Default for Reputation {
    fn default() -> Self {
        Self {
            rating: DEFAULT_RATING,
            fraud_score: DEFAULT_FRAUD_SCORE,
            avg_engagement_rate: 0.0,
        }
    }
}

/// A third-party content channel that can carry placements.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: ChannelId,
    pub owner: UserId,
    pub title: String,
    /// Identifier the delivery collaborator posts to.
    pub external_handle: String,
    pub subscribers: u64,
    /// Floor price per thousand impressions.
    pub min_cpm: Money,
    pub auto_publish: bool,
    pub status: ChannelStatus,
    pub is_active: bool,
    pub region: String,
    pub languages: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    /// Maximum reposts the owner accepts per placement.
    pub repost_preference: u32,
    pub reputation: Option<Reputation>,
}

impl Channel {
    /// Active and verified.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.is_active && self.status == ChannelStatus::Verified
    }

    #[must_use]
    pub fn rating(&self) -> f64 {
        self.reputation.map_or(DEFAULT_RATING, |r| r.rating)
    }

    #[must_use]
    pub fn fraud_score(&self) -> f64 {
        self.reputation.map_or(DEFAULT_FRAUD_SCORE, |r| r.fraud_score)
    }

    /// Observed engagement rate, or `fallback` when absent or not positive.
    #[must_use]
    pub fn engagement_rate(&self, fallback: f64) -> f64 {
        match self.reputation {
            Some(r) if r.avg_engagement_rate > 0.0 => r.avg_engagement_rate,
            _ => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn channel(reputation: Option<Reputation>) -> Channel {
        Channel {
            id: ChannelId::from("ch"),
            owner: UserId::from("owner"),
            title: "Daily News".into(),
            external_handle: "@daily".into(),
            subscribers: 10_000,
            min_cpm: dec!(2),
            auto_publish: false,
            status: ChannelStatus::Verified,
            is_active: true,
            region: "ET".into(),
            languages: BTreeSet::new(),
            categories: BTreeSet::new(),
            repost_preference: 3,
            reputation,
        }
    }

    #[test]
    fn missing_reputation_uses_defaults() {
        let ch = channel(None);
        assert_eq!(ch.rating(), 5.0);
        assert_eq!(ch.fraud_score(), 0.0);
        assert_eq!(ch.engagement_rate(FALLBACK_ENGAGEMENT), 0.15);
    }

    #[test]
    fn zero_engagement_falls_back() {
        let ch = channel(Some(Reputation {
            rating: 4.0,
            fraud_score: 1.0,
            avg_engagement_rate: 0.0,
        }));
        assert_eq!(ch.engagement_rate(FALLBACK_ENGAGEMENT), 0.15);
        assert_eq!(ch.rating(), 4.0);
    }

    #[test]
    fn observed_engagement_is_used() {
        let ch = channel(Some(Reputation {
            avg_engagement_rate: 0.3,
            ..Reputation::default()
        }));
        assert_eq!(ch.engagement_rate(FALLBACK_ENGAGEMENT), 0.3);
    }

    #[test]
    fn listing_requires_active_and_verified() {
        let mut ch = channel(None);
        assert!(ch.is_listed());
        ch.status = ChannelStatus::Pending;
        assert!(!ch.is_listed());
        ch.status = ChannelStatus::Verified;
        ch.is_active = false;
        assert!(!ch.is_listed());
    }
}
