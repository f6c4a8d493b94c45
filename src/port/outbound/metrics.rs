//! Metrics port: cumulative delivery counters per placement.

use async_trait::async_trait;

use crate::domain::performance::DeliveryCounters;
use crate::domain::placement::Placement;

/// Source of delivery snapshots.
///
/// Counters are cumulative since the content went live and usually
/// non-decreasing; the engine clamps negative cost deltas after a reset.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Latest snapshot, or `None` when nothing is available this cycle.
    async fn fetch(&self, placement: &Placement) -> Option<DeliveryCounters>;
}
