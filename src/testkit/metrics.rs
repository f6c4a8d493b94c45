//! Settable [`MetricsSource`] fake.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::id::PlacementId;
use crate::domain::performance::DeliveryCounters;
use crate::domain::placement::Placement;
use crate::port::MetricsSource;

/// Returns whatever snapshot was last set for a placement, or `None`.
#[derive(Default)]
pub struct ScriptedMetrics {
    snapshots: Mutex<HashMap<PlacementId, DeliveryCounters>>,
}

impl ScriptedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cumulative snapshot for a placement.
    pub fn set(&self, placement: &str, counters: DeliveryCounters) {
        self.snapshots
            .lock()
            .insert(PlacementId::from(placement), counters);
    }

    /// Make a placement report nothing.
    pub fn clear(&self, placement: &str) {
        self.snapshots.lock().remove(&PlacementId::from(placement));
    }
}

#[async_trait]
impl MetricsSource for ScriptedMetrics {
    async fn fetch(&self, placement: &Placement) -> Option<DeliveryCounters> {
        self.snapshots.lock().get(&placement.id).copied()
    }
}
