//! Per-campaign mutual exclusion.
//!
//! Activation and metering for one campaign draw on the same escrow budget,
//! so they run one at a time per campaign. Different campaigns never block
//! each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::id::CampaignId;

/// Guard held while a unit of work runs for one campaign.
pub type CampaignGuard = OwnedMutexGuard<()>;

/// Lazily created async mutex per campaign. Clones share the same table.
#[derive(Clone, Default)]
pub struct CampaignLocks {
    locks: Arc<DashMap<CampaignId, Arc<Mutex<()>>>>,
}

impl CampaignLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `campaign`.
    pub async fn acquire(&self, campaign: &CampaignId) -> CampaignGuard {
        let lock = self
            .locks
            .entry(campaign.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Exclusive access to `campaign` if nobody holds it.
    #[must_use]
    pub fn try_acquire(&self, campaign: &CampaignId) -> Option<CampaignGuard> {
        let lock = self
            .locks
            .entry(campaign.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().ok()
    }

    /// Drop entries nobody holds or waits on. Returns how many were removed.
    ///
    /// Holders and waiters keep a clone of the mutex, so an entry whose only
    /// reference is the table is idle. A later `acquire` recreates it.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Campaigns with a live entry in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
