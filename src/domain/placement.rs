//! Placements and their status state machine.
//!
//! A placement is one ad running on one channel. Status changes go through
//! [`Placement::transition`], which validates the edge and returns the side
//! effects the caller must carry out once the change is committed. Nothing
//! here talks to storage or delivery.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{AdId, CampaignId, ChannelId, PlacementId};
use super::money::Money;

/// Placement lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    Draft,
    Pending,
    Approved,
    Running,
    Paused,
    Completed,
    Stopped,
    Rejected,
    Expired,
}

impl PlacementStatus {
    /// Statuses the metering engine bills.
    pub const METERED: [Self; 3] = [Self::Approved, Self::Running, Self::Completed];

    /// Statuses the allocator may (re)assign and activate.
    pub const REASSIGNABLE: [Self; 2] = [Self::Draft, Self::Completed];

    /// Stable name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    #[must_use]
    pub fn is_metered(self) -> bool {
        Self::METERED.contains(&self)
    }

    #[must_use]
    pub fn is_reassignable(self) -> bool {
        Self::REASSIGNABLE.contains(&self)
    }

    /// No edge leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Rejected | Self::Expired)
    }

    /// Whether the state machine has an edge from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use PlacementStatus::*;
        matches!(
            (self, next),
            (Draft, Pending | Approved | Stopped)
                | (Completed, Pending | Approved)
                | (Pending, Approved | Rejected | Expired | Stopped)
                | (Approved, Running | Pending | Paused | Stopped | Completed | Expired)
                | (Running, Paused | Stopped | Completed | Expired)
                | (Paused, Running | Stopped | Completed)
        )
    }

    const fn notifies_owner(self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Running | Self::Rejected | Self::Paused | Self::Completed
        )
    }
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "draft" => Self::Draft,
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            "stopped" => Self::Stopped,
            "rejected" => Self::Rejected,
            "expired" => Self::Expired,
            other => {
                return Err(DomainError::UnknownStatus {
                    kind: "placement",
                    value: other.to_string(),
                })
            }
        })
    }
}

/// Who is driving a status change.
///
/// `Batch` marks changes made by the activation pass, which posts content
/// itself; `Single` marks one-off changes such as a creator approving a
/// pending placement, where the caller must publish afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    Batch,
    Single,
}

/// Side effect to run after a committed status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Post the placement's ad to its channel.
    Publish(PlacementId),
    /// Tell the channel owner about the new status.
    NotifyOwner {
        placement: PlacementId,
        status: PlacementStatus,
    },
}

/// One ad on one channel. Unique per (ad, channel).
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: PlacementId,
    pub ad_id: AdId,
    pub channel_id: ChannelId,
    pub campaign_id: CampaignId,
    pub status: PlacementStatus,
    /// Last computed match score.
    pub preference_score: f64,
    pub winning_bid_price: Money,
    /// External content reference once live.
    pub content_platform_id: Option<String>,
    pub repost_count: u32,
    pub max_reposts: u32,
}

impl Placement {
    /// Move to `next`, returning the follow-ups the caller must execute.
    ///
    /// Moving to the current status is a no-op with no follow-ups.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPlacementTransition`] when there is no
    /// edge from the current status to `next`.
    pub fn transition(
        &mut self,
        next: PlacementStatus,
        origin: TransitionOrigin,
    ) -> Result<Vec<FollowUp>, DomainError> {
        if self.status == next {
            return Ok(Vec::new());
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidPlacementTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;

        let mut follow_ups = Vec::new();
        if next == PlacementStatus::Approved && origin == TransitionOrigin::Single {
            follow_ups.push(FollowUp::Publish(self.id.clone()));
        }
        if next.notifies_owner() {
            follow_ups.push(FollowUp::NotifyOwner {
                placement: self.id.clone(),
                status: next,
            });
        }
        Ok(follow_ups)
    }

    #[must_use]
    pub fn can_repost(&self) -> bool {
        self.status == PlacementStatus::Running && self.repost_count < self.max_reposts
    }
}
