//! Campaigns, their targeting, and their creatives.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{AdId, CampaignId, UserId};
use super::money::Money;

/// What the advertiser is optimising for. Selects the weight profile used
/// when placements are activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    BrandAwareness,
    Engagement,
    Conversion,
    Traffic,
}

impl Objective {
    /// Stable name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BrandAwareness => "brand_awareness",
            Self::Engagement => "engagement",
            Self::Conversion => "conversion",
            Self::Traffic => "traffic",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brand_awareness" => Ok(Self::BrandAwareness),
            "engagement" => Ok(Self::Engagement),
            "conversion" => Ok(Self::Conversion),
            "traffic" => Ok(Self::Traffic),
            other => Err(DomainError::UnknownObjective(other.to_string())),
        }
    }
}

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    InReview,
    Scheduled,
    Active,
    OnHold,
    Stopped,
    Declined,
    Completed,
}

impl CampaignStatus {
    /// Stable name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Stopped => "stopped",
            Self::Declined => "declined",
            Self::Completed => "completed",
        }
    }

    /// Only active campaigns may have delivery settled against them.
    #[must_use]
    pub const fn accepts_settlement(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "draft" => Self::Draft,
            "in_review" => Self::InReview,
            "scheduled" => Self::Scheduled,
            "active" => Self::Active,
            "on_hold" => Self::OnHold,
            "stopped" => Self::Stopped,
            "declined" => Self::Declined,
            "completed" => Self::Completed,
            other => {
                return Err(DomainError::UnknownStatus {
                    kind: "campaign",
                    value: other.to_string(),
                })
            }
        })
    }
}

/// Audience targeting. Matching requires a non-empty intersection on both
/// languages and categories; regions only contribute to the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targeting {
    pub languages: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub regions: BTreeSet<String>,
}

/// Where a campaign sits relative to its flight dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Start date is in the future.
    NotStarted,
    /// Within flight dates (or no dates set).
    Running,
    /// End date has passed.
    Expired,
}

/// An advertiser campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: CampaignId,
    pub advertiser: UserId,
    pub name: String,
    pub objective: Objective,
    /// Ceiling bid per thousand impressions.
    pub cpm: Money,
    pub initial_budget: Money,
    /// Monotonically non-decreasing.
    pub total_spent: Money,
    pub status: CampaignStatus,
    pub targeting: Targeting,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Campaign {
    /// Budget not yet spent on metered delivery.
    #[must_use]
    pub fn remaining_budget(&self) -> Money {
        self.initial_budget - self.total_spent
    }

    /// Classify the campaign against `today`.
    #[must_use]
    pub fn schedule(&self, today: NaiveDate) -> Schedule {
        if self.end_date.is_some_and(|end| end < today) {
            return Schedule::Expired;
        }
        if self.start_date.is_some_and(|start| start > today) {
            return Schedule::NotStarted;
        }
        Schedule::Running
    }
}

/// A creative. Exactly one is expected to be active at a time, but the
/// allocator handles any number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ad {
    pub id: AdId,
    pub campaign_id: CampaignId,
    pub headline: String,
    pub body: String,
    pub is_active: bool,
}
