//! Delivery counters and per-cycle performance records.

use std::iter::Sum;
use std::ops::{Add, Sub};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{PlacementId, RecordId};
use super::money::{round_money, Money};
use super::objective::round2;

/// Delivery counters for a placement.
///
/// Snapshots from the metrics source are cumulative; stored records hold
/// per-cycle deltas. Fields are signed so a metrics-source reset can be
/// recorded as a negative delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounters {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub reposts: i64,
    pub reactions: i64,
    pub replies: i64,
    pub views: i64,
    pub forwards: i64,
}

impl Add for DeliveryCounters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            impressions: self.impressions + rhs.impressions,
            clicks: self.clicks + rhs.clicks,
            conversions: self.conversions + rhs.conversions,
            reposts: self.reposts + rhs.reposts,
            reactions: self.reactions + rhs.reactions,
            replies: self.replies + rhs.replies,
            views: self.views + rhs.views,
            forwards: self.forwards + rhs.forwards,
        }
    }
}

impl Sub for DeliveryCounters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            impressions: self.impressions - rhs.impressions,
            clicks: self.clicks - rhs.clicks,
            conversions: self.conversions - rhs.conversions,
            reposts: self.reposts - rhs.reposts,
            reactions: self.reactions - rhs.reactions,
            replies: self.replies - rhs.replies,
            views: self.views - rhs.views,
            forwards: self.forwards - rhs.forwards,
        }
    }
}

impl Sum for DeliveryCounters {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Newly delivered counters since the last cycle and what they cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceDelta {
    pub counters: DeliveryCounters,
    pub cost: Money,
}

impl PerformanceDelta {
    /// Delta between a cumulative `snapshot` and the reconstructed
    /// `previous` total, priced at `min_cpm` per thousand impressions.
    ///
    /// Cost is floored at zero and rounded to two places.
    #[must_use]
    pub fn compute(snapshot: DeliveryCounters, previous: DeliveryCounters, min_cpm: Money) -> Self {
        let counters = snapshot - previous;
        let raw = Decimal::from(counters.impressions) * min_cpm / Decimal::ONE_THOUSAND;
        Self {
            counters,
            cost: round_money(raw.max(Decimal::ZERO)),
        }
    }

    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.cost > Decimal::ZERO
    }
}

/// One metering cycle's delta for one placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceRecord {
    pub id: RecordId,
    pub placement_id: PlacementId,
    pub counters: DeliveryCounters,
    pub cost: Money,
    /// Set once the ledger settlement for this delta has committed.
    pub is_deducted: bool,
    pub recorded_at: DateTime<Utc>,
}

fn percent(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2(numerator as f64 / denominator as f64 * 100.0)
}

impl PerformanceRecord {
    /// Click-through rate, percent.
    #[must_use]
    pub fn ctr(&self) -> f64 {
        percent(self.counters.clicks, self.counters.impressions)
    }

    /// Cost per click.
    #[must_use]
    pub fn cpc(&self) -> Money {
        if self.counters.clicks == 0 {
            return Decimal::ZERO;
        }
        round_money(self.cost / Decimal::from(self.counters.clicks))
    }

    /// Conversions per click, percent.
    #[must_use]
    pub fn conversion_rate(&self) -> f64 {
        percent(self.counters.conversions, self.counters.clicks)
    }

    /// Reactions and replies per impression, percent.
    #[must_use]
    pub fn engagement_rate(&self) -> f64 {
        percent(
            self.counters.reactions + self.counters.replies,
            self.counters.impressions,
        )
    }

    /// Views per impression, percent.
    #[must_use]
    pub fn viewability_rate(&self) -> f64 {
        percent(self.counters.views, self.counters.impressions)
    }

    /// Forwards per view, percent.
    #[must_use]
    pub fn virality_rate(&self) -> f64 {
        percent(self.counters.forwards, self.counters.views)
    }

    /// Portion of `cost` owed to the channel owner after `platform_fee`.
    #[must_use]
    pub fn creator_share(&self, platform_fee: Decimal) -> Money {
        round_money(self.cost * (Decimal::ONE - platform_fee))
    }
}
