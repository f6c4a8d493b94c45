//! Append-only audit trail of matching decisions.

use chrono::{DateTime, Utc};

use super::id::{CampaignId, PlacementId};
use super::money::Money;

/// Which allocator step produced the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    /// Draft placement created or refreshed by `assign`.
    InitialMatch,
    /// Placement promoted by `activate`.
    Activated,
}

impl MatchStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialMatch => "initial_match",
            Self::Activated => "activated",
        }
    }

    /// Bracketed label prefixed to the reason text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InitialMatch => "[Initial Match]",
            Self::Activated => "[Activated]",
        }
    }
}

/// Why, and at what estimated cost, a placement was created or activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLog {
    pub campaign_id: CampaignId,
    pub placement_id: PlacementId,
    pub stage: MatchStage,
    pub reason: String,
    pub estimated_cost: Money,
    pub created_at: DateTime<Utc>,
}
