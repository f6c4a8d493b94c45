//! Delta metering, budget eviction and settlement.
//!
//! Each cycle meters campaigns independently. Within a campaign, every
//! placement's cumulative snapshot is turned into a delta against the sum of
//! its stored records and priced at the channel floor. If the deltas would
//! overrun the campaign's remaining budget, the most expensive placements are
//! kept greedily against that fixed budget and the rest are evicted. Kept
//! deltas are settled one placement per atomic unit: the performance record,
//! the escrow draw, and the campaign spend commit together.

use std::sync::Arc;

use chrono::Utc;
use diesel::SqliteConnection;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::ledger::LedgerService;
use super::lock::CampaignLocks;
use super::reference;
use crate::adapter::outbound::sqlite::campaign::{add_spend, get_campaign, set_campaign_status};
use crate::adapter::outbound::sqlite::channel::get_channel;
use crate::adapter::outbound::sqlite::ledger::pending_escrow_for;
use crate::adapter::outbound::sqlite::performance::{
    history_total, insert_record, mark_deducted, unsettled,
};
use crate::adapter::outbound::sqlite::placement::{
    by_campaign, campaigns_with, get_placement, save_placement,
};
use crate::adapter::outbound::sqlite::Database;
use crate::domain::campaign::{Campaign, CampaignStatus};
use crate::domain::channel::Channel;
use crate::domain::id::{CampaignId, PlacementId, RecordId};
use crate::domain::money::Money;
use crate::domain::performance::{PerformanceDelta, PerformanceRecord};
use crate::domain::placement::{FollowUp, Placement, PlacementStatus, TransitionOrigin};
use crate::error::{DeliveryError, MeteringError, Result};
use crate::infrastructure::config::metering::MeteringConfig;
use crate::port::{DeleteRequest, Delivery, DeliveryAction, Event, MetricsSource, Notifier};

/// Why a placement produced nothing this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The metrics source had no snapshot.
    NoSnapshot,
    /// Nothing billable since the last record.
    NoDelta,
    /// The campaign left `active` before this placement settled.
    CampaignInactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub placement: PlacementId,
    pub reason: SkipReason,
}

/// A delta billed to the campaign's escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub placement: PlacementId,
    pub record: RecordId,
    pub cost: Money,
    pub creator_share: Money,
    pub reference: String,
}

/// A placement removed to keep the campaign within budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    pub placement: PlacementId,
    pub cost: Money,
    /// Whether the delivery collaborator confirmed the content was removed.
    pub content_removed: bool,
}

/// A settlement rolled back for this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abandoned {
    pub placement: PlacementId,
    pub reason: String,
}

/// Outcome of metering one campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub campaign: CampaignId,
    pub settled: Vec<Settled>,
    pub skipped: Vec<Skipped>,
    pub evicted: Vec<Evicted>,
    pub abandoned: Vec<Abandoned>,
    /// Every billable placement was evicted and the campaign was stopped.
    pub stopped: bool,
}

impl CycleReport {
    fn new(campaign: &CampaignId) -> Self {
        Self {
            campaign: campaign.clone(),
            settled: Vec::new(),
            skipped: Vec::new(),
            evicted: Vec::new(),
            abandoned: Vec::new(),
            stopped: false,
        }
    }

    /// Sum of settled costs.
    #[must_use]
    pub fn total_settled(&self) -> Money {
        self.settled.iter().map(|s| s.cost).sum()
    }

    fn skip(&mut self, placement: &PlacementId, reason: SkipReason) {
        self.skipped.push(Skipped {
            placement: placement.clone(),
            reason,
        });
    }
}

/// Split `items` into (kept, evicted) against a fixed `budget`.
///
/// Items are ordered by cost, most expensive first, and each is kept only if
/// the kept total stays within `budget`. The budget is not reduced as items
/// are evicted; a later cheaper item may still be kept.
pub fn split_for_budget<T, F>(mut items: Vec<T>, cost: F, budget: Money) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> Money,
{
    items.sort_by(|a, b| cost(b).cmp(&cost(a)));

    let mut kept = Vec::new();
    let mut evicted = Vec::new();
    let mut running = Decimal::ZERO;
    for item in items {
        let c = cost(&item);
        if running + c <= budget {
            running += c;
            kept.push(item);
        } else {
            evicted.push(item);
        }
    }
    (kept, evicted)
}

struct Metered {
    placement: Placement,
    channel: Channel,
    delta: PerformanceDelta,
}

enum Settlement {
    Settled(Settled),
    Inactive(CampaignStatus),
}

/// Meters delivery and settles it through the ledger.
pub struct MeteringEngine {
    db: Database,
    ledger: LedgerService,
    metrics: Arc<dyn MetricsSource>,
    delivery: Arc<dyn Delivery>,
    notifier: Arc<dyn Notifier>,
    locks: CampaignLocks,
    config: MeteringConfig,
}

impl MeteringEngine {
    #[must_use]
    pub fn new(
        ledger: LedgerService,
        metrics: Arc<dyn MetricsSource>,
        delivery: Arc<dyn Delivery>,
        notifier: Arc<dyn Notifier>,
        locks: CampaignLocks,
        config: MeteringConfig,
    ) -> Self {
        Self {
            db: ledger.database().clone(),
            ledger,
            metrics,
            delivery,
            notifier,
            locks,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MeteringConfig {
        &self.config
    }

    /// Meter every campaign that has placements in a metered status.
    ///
    /// Campaigns run concurrently up to `max_concurrent_campaigns`. A
    /// campaign that fails is logged and left out of the result.
    ///
    /// # Errors
    /// Returns an error only if the campaign list cannot be read.
    pub async fn run_cycle(&self) -> Result<Vec<CycleReport>> {
        let campaigns = {
            let mut conn = self.db.connection()?;
            campaigns_with(&mut conn, &PlacementStatus::METERED)?
        };
        info!(campaigns = campaigns.len(), "Metering cycle started");

        let results: Vec<(CampaignId, Result<CycleReport>)> = stream::iter(campaigns)
            .map(|campaign| async move {
                let result = self.meter_campaign(&campaign).await;
                (campaign, result)
            })
            .buffer_unordered(self.config.max_concurrent_campaigns.max(1))
            .collect()
            .await;
        let pruned = self.locks.prune();
        debug!(pruned, "Idle campaign locks pruned");

        let mut reports = Vec::with_capacity(results.len());
        for (campaign, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!(campaign_id = %campaign, error = %e, "Failed to meter campaign"),
            }
        }
        info!(
            metered = reports.len(),
            settled = reports.iter().map(|r| r.settled.len()).sum::<usize>(),
            evicted = reports.iter().map(|r| r.evicted.len()).sum::<usize>(),
            "Metering cycle finished"
        );
        Ok(reports)
    }

    /// Meter one campaign under its lock.
    ///
    /// # Errors
    /// Returns an error if the campaign or its placements cannot be loaded.
    /// Per-placement failures are recorded in the report.
    pub async fn meter_campaign(&self, campaign_id: &CampaignId) -> Result<CycleReport> {
        let _guard = self.locks.acquire(campaign_id).await;
        let mut report = CycleReport::new(campaign_id);

        let (campaign, targets) = self.load(campaign_id)?;
        if !campaign.status.accepts_settlement() {
            debug!(campaign_id = %campaign_id, status = %campaign.status, "Campaign not active; not metering");
            return Ok(report);
        }
        let remaining = campaign.remaining_budget();
        info!(campaign_id = %campaign_id, remaining = %remaining, "Metering campaign");

        let mut deltas = Vec::new();
        for (placement, channel) in targets {
            let Some(snapshot) = self.metrics.fetch(&placement).await else {
                warn!(placement_id = %placement.id, "No metrics for placement");
                report.skip(&placement.id, SkipReason::NoSnapshot);
                continue;
            };
            let previous = {
                let mut conn = self.db.connection()?;
                history_total(&mut conn, &placement.id)?
            };
            let delta = PerformanceDelta::compute(snapshot, previous, channel.min_cpm);
            if !delta.is_billable() {
                debug!(placement_id = %placement.id, "No billable delta");
                report.skip(&placement.id, SkipReason::NoDelta);
                continue;
            }
            deltas.push(Metered {
                placement,
                channel,
                delta,
            });
        }
        if deltas.is_empty() {
            info!(campaign_id = %campaign_id, "No billable deltas");
            return Ok(report);
        }

        let estimated: Money = deltas.iter().map(|m| m.delta.cost).sum();
        let threshold = remaining - estimated;
        info!(
            campaign_id = %campaign_id,
            estimated = %estimated,
            threshold = %threshold,
            "Deltas priced"
        );

        let kept = if threshold >= Decimal::ZERO {
            deltas
        } else {
            let (kept, evicted) = split_for_budget(deltas, |m| m.delta.cost, remaining);
            warn!(
                campaign_id = %campaign_id,
                evicting = evicted.len(),
                keeping = kept.len(),
                "Over budget; evicting placements"
            );
            for item in &evicted {
                let eviction = self.evict(&campaign, item).await;
                report.evicted.push(eviction);
            }
            if kept.is_empty() {
                self.db
                    .atomic(|conn| set_campaign_status(conn, campaign_id, CampaignStatus::Stopped))?;
                warn!(campaign_id = %campaign_id, "Every placement evicted; campaign stopped");
                self.notifier.notify(Event::CampaignStopped {
                    campaign: campaign_id.clone(),
                });
                report.stopped = true;
                return Ok(report);
            }
            kept
        };

        for item in &kept {
            match self.db.atomic(|conn| self.settle(conn, &campaign, item)) {
                Ok(Settlement::Settled(settled)) => {
                    info!(
                        placement_id = %settled.placement,
                        cost = %settled.cost,
                        reference = %settled.reference,
                        "Delta settled"
                    );
                    report.settled.push(settled);
                }
                Ok(Settlement::Inactive(status)) => {
                    warn!(
                        campaign_id = %campaign_id,
                        placement_id = %item.placement.id,
                        status = %status,
                        "Campaign no longer active; settlement skipped"
                    );
                    report.skip(&item.placement.id, SkipReason::CampaignInactive);
                }
                Err(e) => {
                    error!(
                        campaign_id = %campaign_id,
                        placement_id = %item.placement.id,
                        error = %e,
                        "Settlement abandoned"
                    );
                    self.notifier.notify(Event::SettlementAbandoned {
                        campaign: campaign_id.clone(),
                        placement: item.placement.id.clone(),
                        reason: e.to_string(),
                    });
                    report.abandoned.push(Abandoned {
                        placement: item.placement.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            campaign_id = %campaign_id,
            settled = report.settled.len(),
            total = %report.total_settled(),
            abandoned = report.abandoned.len(),
            "Campaign metered"
        );
        Ok(report)
    }

    fn load(&self, campaign_id: &CampaignId) -> Result<(Campaign, Vec<(Placement, Channel)>)> {
        let mut conn = self.db.connection()?;
        let campaign = get_campaign(&mut conn, campaign_id)?;
        let placements = by_campaign(&mut conn, campaign_id, &PlacementStatus::METERED)?;
        let mut targets = Vec::with_capacity(placements.len());
        for placement in placements {
            let channel = get_channel(&mut conn, &placement.channel_id)?;
            targets.push((placement, channel));
        }
        Ok((campaign, targets))
    }

    /// Record and bill one delta. Any error rolls the whole unit back.
    fn settle(
        &self,
        conn: &mut SqliteConnection,
        campaign: &Campaign,
        item: &Metered,
    ) -> Result<Settlement> {
        let current = get_campaign(conn, &campaign.id)?;
        if !current.status.accepts_settlement() {
            return Ok(Settlement::Inactive(current.status));
        }

        let now = Utc::now();
        let record = PerformanceRecord {
            id: RecordId::new(),
            placement_id: item.placement.id.clone(),
            counters: item.delta.counters,
            cost: item.delta.cost,
            is_deducted: false,
            recorded_at: now,
        };
        insert_record(conn, &record)?;

        let creator = &item.channel.owner;
        let escrow = pending_escrow_for(conn, &campaign.advertiser, &campaign.id, creator)?
            .ok_or_else(|| MeteringError::NoMatchingEscrow {
                placement: item.placement.id.to_string(),
                campaign: campaign.id.to_string(),
                creator: creator.to_string(),
            })?;

        let stem = reference::unique_with(conn, "ADP", self.ledger.reference_attempts(), || {
            reference::settlement_candidate(item.placement.id.as_str(), now)
        })?;
        let earning = self
            .ledger
            .record_earning_in(conn, &escrow.id, creator, record.cost, Some(stem))?;

        mark_deducted(conn, &record.id)?;
        add_spend(conn, &campaign.id, record.cost)?;

        Ok(Settlement::Settled(Settled {
            placement: record.placement_id,
            record: record.id,
            cost: earning.amount,
            creator_share: earning.creator_share,
            reference: earning.reference,
        }))
    }

    /// Remove content and complete the placement. The status change does not
    /// depend on the delete succeeding.
    async fn evict(&self, campaign: &Campaign, item: &Metered) -> Evicted {
        let placement = &item.placement;
        let deleted = match &placement.content_platform_id {
            Some(content_ref) => {
                self.delivery
                    .delete(&DeleteRequest {
                        placement: placement.id.clone(),
                        channel: item.channel.external_handle.clone(),
                        content_ref: content_ref.clone(),
                    })
                    .await
            }
            None => Err(DeliveryError::MissingContentRef(placement.id.to_string())),
        };

        let content_removed = match deleted {
            Ok(()) => {
                info!(placement_id = %placement.id, "Deleted content of evicted placement");
                true
            }
            Err(e) => {
                warn!(placement_id = %placement.id, error = %e, "Failed to delete evicted content");
                self.notifier.notify(Event::DeliveryFailed {
                    placement: placement.id.clone(),
                    action: DeliveryAction::Delete,
                    reason: e.to_string(),
                });
                false
            }
        };

        if let Err(e) = self.complete(&placement.id) {
            error!(placement_id = %placement.id, error = %e, "Failed to complete evicted placement");
        }
        self.notifier.notify(Event::PlacementEvicted {
            campaign: campaign.id.clone(),
            placement: placement.id.clone(),
            cost: item.delta.cost,
        });

        Evicted {
            placement: placement.id.clone(),
            cost: item.delta.cost,
            content_removed,
        }
    }

    fn complete(&self, id: &PlacementId) -> Result<()> {
        let follow_ups = self.db.atomic(|conn| {
            let mut placement = get_placement(conn, id)?;
            let follow_ups = placement.transition(PlacementStatus::Completed, TransitionOrigin::Batch)?;
            save_placement(conn, &placement)?;
            Ok(follow_ups)
        })?;
        for follow_up in follow_ups {
            if let FollowUp::NotifyOwner { placement, status } = follow_up {
                self.notifier
                    .notify(Event::PlacementStatusChanged { placement, status });
            }
        }
        Ok(())
    }

    /// Billable records whose settlement never committed.
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub fn unsettled_records(&self) -> Result<Vec<PerformanceRecord>> {
        let mut conn = self.db.connection()?;
        unsettled(&mut conn)
    }
}
