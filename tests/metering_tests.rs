mod common;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use adzengine::adapter::outbound::sqlite::campaign::set_campaign_status;
use adzengine::adapter::outbound::sqlite::Database;
use adzengine::application::metering::{split_for_budget, SkipReason};
use adzengine::domain::campaign::CampaignStatus;
use adzengine::domain::id::CampaignId;
use adzengine::domain::money::Money;
use adzengine::domain::performance::DeliveryCounters;
use adzengine::domain::placement::{Placement, PlacementStatus};
use adzengine::port::{Event, MetricsSource};
use adzengine::testkit::domain::impressions;
use adzengine::testkit::metrics::ScriptedMetrics;
use common::harness::{advertiser, Harness};

/// Stops the campaign while its snapshot is being read.
struct StoppingMetrics {
    inner: Arc<ScriptedMetrics>,
    db: Database,
    campaign: CampaignId,
}

#[async_trait]
impl MetricsSource for StoppingMetrics {
    async fn fetch(&self, placement: &Placement) -> Option<DeliveryCounters> {
        self.db
            .atomic(|conn| set_campaign_status(conn, &self.campaign, CampaignStatus::Stopped))
            .unwrap();
        self.inner.fetch(placement).await
    }
}

#[tokio::test]
async fn delta_cost_uses_channel_min_cpm() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let placement = h.running_placement(&campaign, "ch1");
    h.fund(&campaign, dec!(500), &["ch1"]);

    // 10_000 impressions at min CPM 5.00
    h.metrics.set(placement.as_str(), impressions(10_000));
    let report = h.engine.metering.meter_campaign(&campaign).await.unwrap();

    assert_eq!(report.settled.len(), 1);
    assert_eq!(report.settled[0].cost, dec!(50.00));
    assert_eq!(report.settled[0].creator_share, dec!(42.50));
    assert!(h.engine.metering.unsettled_records().unwrap().is_empty());
}

#[tokio::test]
async fn over_budget_cycle_keeps_most_expensive_placement() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(400));
    let p1 = h.running_placement(&campaign, "ch1");
    let p2 = h.running_placement(&campaign, "ch2");
    let p3 = h.running_placement(&campaign, "ch3");
    h.fund(&campaign, dec!(500), &["ch1", "ch2", "ch3"]);

    // Costs 300, 250 and 200 against a remaining budget of 400.
    h.metrics.set(p1.as_str(), impressions(60_000));
    h.metrics.set(p2.as_str(), impressions(50_000));
    h.metrics.set(p3.as_str(), impressions(40_000));

    let report = h.engine.metering.meter_campaign(&campaign).await.unwrap();

    assert_eq!(report.settled.len(), 1);
    assert_eq!(report.settled[0].placement, p1);
    assert_eq!(report.settled[0].cost, dec!(300));

    let mut evicted: Vec<Money> = report.evicted.iter().map(|e| e.cost).collect();
    evicted.sort();
    assert_eq!(evicted, vec![dec!(200), dec!(250)]);
    assert!(report.evicted.iter().all(|e| e.content_removed));
    assert_eq!(h.delivery.delete_count(), 2);

    assert_eq!(h.stored_placement(&p1).status, PlacementStatus::Running);
    assert_eq!(h.stored_placement(&p2).status, PlacementStatus::Completed);
    assert_eq!(h.stored_placement(&p3).status, PlacementStatus::Completed);
    assert_eq!(
        h.notifier
            .count(|e| matches!(e, Event::PlacementEvicted { .. })),
        2
    );
    assert_eq!(h.stored_campaign(&campaign).total_spent, dec!(300));
}

#[tokio::test]
async fn total_spent_never_exceeds_budget_across_cycles() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(100));
    let placement = h.running_placement(&campaign, "ch1");
    h.fund(&campaign, dec!(500), &["ch1"]);

    // Cumulative snapshots: deltas cost 50, then 40, then 60.
    for (snapshot, spent) in [(10_000, dec!(50)), (18_000, dec!(90)), (30_000, dec!(90))] {
        h.metrics.set(placement.as_str(), impressions(snapshot));
        h.engine.metering.meter_campaign(&campaign).await.unwrap();
        let stored = h.stored_campaign(&campaign);
        assert_eq!(stored.total_spent, spent);
        assert!(stored.total_spent <= stored.initial_budget);
    }

    let stored = h.stored_campaign(&campaign);
    assert_eq!(stored.status, CampaignStatus::Stopped);
    assert_eq!(h.stored_placement(&placement).status, PlacementStatus::Completed);
    assert_eq!(
        h.notifier
            .count(|e| matches!(e, Event::CampaignStopped { .. })),
        1
    );
}

fn assert_greedy(costs: &[Money], budget: Money) {
    let (kept, evicted) = split_for_budget(costs.to_vec(), |c| *c, budget);
    assert_eq!(kept.len() + evicted.len(), costs.len());

    let kept_total: Money = kept.iter().copied().sum();
    assert!(kept_total <= budget, "{costs:?} kept {kept_total} over {budget}");

    // Every eviction is forced: the item would not fit on top of the kept
    // items at least as expensive as itself.
    for cost in &evicted {
        let ahead: Money = kept.iter().filter(|k| *k >= cost).copied().sum();
        assert!(ahead + cost > budget, "{cost} evicted from {costs:?} but fits");
    }
    assert!(kept.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn eviction_is_a_single_greedy_pass() {
    assert_greedy(&[dec!(300), dec!(250), dec!(200)], dec!(400));
    assert_greedy(&[dec!(300), dec!(250), dec!(90)], dec!(400));
    assert_greedy(&[dec!(10), dec!(20), dec!(30), dec!(40)], dec!(55));
    assert_greedy(&[dec!(99.99), dec!(0.01), dec!(100)], dec!(100));
    assert_greedy(&[dec!(5)], Decimal::ZERO);

    let (kept, evicted) = split_for_budget(vec![dec!(300), dec!(250), dec!(200)], |c| *c, dec!(400));
    assert_eq!(kept, vec![dec!(300)]);
    assert_eq!(evicted, vec![dec!(250), dec!(200)]);
}

#[tokio::test]
async fn campaign_stopped_mid_cycle_settles_nothing() {
    let h = Harness::with_metrics(|db, inner| {
        Arc::new(StoppingMetrics {
            inner,
            db,
            campaign: CampaignId::from("c1"),
        })
    });
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let placement = h.running_placement(&campaign, "ch1");
    let escrow = h.fund(&campaign, dec!(500), &["ch1"]);
    h.metrics.set(placement.as_str(), impressions(10_000));

    let report = h.engine.metering.meter_campaign(&campaign).await.unwrap();
    assert!(report.settled.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::CampaignInactive);

    let stored = h.stored_campaign(&campaign);
    assert_eq!(stored.status, CampaignStatus::Stopped);
    assert_eq!(stored.total_spent, dec!(0));
    assert_eq!(h.engine.ledger.escrow(&escrow).unwrap().remaining_amount, dec!(500));
    let adv = h.engine.ledger.balance(&advertiser()).unwrap();
    assert_eq!(adv.buckets.escrow, dec!(500));
}

#[tokio::test]
async fn completed_campaign_is_not_metered() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let placement = h.running_placement(&campaign, "ch1");
    h.fund(&campaign, dec!(500), &["ch1"]);
    h.metrics.set(placement.as_str(), impressions(10_000));
    h.engine
        .db
        .atomic(|conn| set_campaign_status(conn, &campaign, CampaignStatus::Completed))
        .unwrap();

    let report = h.engine.metering.meter_campaign(&campaign).await.unwrap();
    assert!(report.settled.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(h.stored_campaign(&campaign).total_spent, dec!(0));
    // The delta stays unbilled; no record marks it settled.
    assert!(h.engine.metering.unsettled_records().unwrap().is_empty());
}
