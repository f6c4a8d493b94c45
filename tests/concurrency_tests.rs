mod common;

use std::time::Duration;

use rust_decimal_macros::dec;
use tempfile::TempDir;

use adzengine::infrastructure::config::settings::Config;
use adzengine::testkit::config;
use adzengine::testkit::delivery::ScriptedDelivery;
use adzengine::testkit::domain::impressions;
use common::harness::{advertiser, owner, Harness};

/// A harness over a pooled file database, so units of work really contend.
fn file_harness() -> (Harness, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config: Config = config::in_memory();
    config.database.url = dir.path().join("engine.db").to_string_lossy().into_owned();
    config.database.pool_size = 4;
    config.metering = config::metering(4);
    (Harness::with_config(&config, ScriptedDelivery::new()), dir)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn campaigns_meter_independently() {
    let (h, _dir) = file_harness();
    let first = h.campaign_with_budget("c1", dec!(1000));
    let second = h.campaign_with_budget("c2", dec!(1000));
    let p1 = h.running_placement(&first, "ch1");
    let p2 = h.running_placement(&second, "ch2");
    h.fund(&first, dec!(500), &["ch1"]);
    h.fund(&second, dec!(500), &["ch2"]);
    h.metrics.set(p1.as_str(), impressions(10_000));
    h.metrics.set(p2.as_str(), impressions(20_000));

    let (a, b) = tokio::join!(
        h.engine.metering.meter_campaign(&first),
        h.engine.metering.meter_campaign(&second),
    );
    assert_eq!(a.unwrap().total_settled(), dec!(50));
    assert_eq!(b.unwrap().total_settled(), dec!(100));

    assert_eq!(h.stored_campaign(&first).total_spent, dec!(50));
    assert_eq!(h.stored_campaign(&second).total_spent, dec!(100));

    let ledger = &h.engine.ledger;
    let adv = ledger.balance(&advertiser()).unwrap();
    assert_eq!(adv.buckets.escrow, dec!(850));
    for user in [advertiser(), owner("ch1"), owner("ch2")] {
        let live = ledger.balance(&user).unwrap();
        assert_eq!(ledger.replay(&user).unwrap(), live.buckets, "replay for {user}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_cycle_settles_every_campaign_once() {
    let (h, _dir) = file_harness();
    let mut placements = Vec::new();
    for n in 1..=4 {
        let campaign = h.campaign_with_budget(&format!("c{n}"), dec!(1000));
        let channel = format!("ch{n}");
        placements.push(h.running_placement(&campaign, &channel));
        h.fund(&campaign, dec!(200), &[channel.as_str()]);
    }
    for placement in &placements {
        h.metrics.set(placement.as_str(), impressions(10_000));
    }

    let reports = h.engine.metering.run_cycle().await.unwrap();
    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.total_settled() == dec!(50)));
    // Every campaign lock was released, so the table is empty again.
    assert!(h.engine.locks.is_empty());

    // A second pass over the same snapshots bills nothing.
    let again = h.engine.metering.run_cycle().await.unwrap();
    assert!(again.iter().all(|r| r.settled.is_empty()));
    assert!(h.engine.metering.unsettled_records().unwrap().is_empty());

    let adv = h.engine.ledger.balance(&advertiser()).unwrap();
    assert_eq!(adv.buckets.escrow, dec!(600));
}

#[tokio::test]
async fn metering_waits_for_a_campaign_held_by_activation() {
    let (h, _dir) = file_harness();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let placement = h.running_placement(&campaign, "ch1");
    h.fund(&campaign, dec!(500), &["ch1"]);
    h.metrics.set(placement.as_str(), impressions(10_000));

    let guard = h.engine.locks.acquire(&campaign).await;
    let blocked = tokio::time::timeout(
        Duration::from_millis(100),
        h.engine.metering.meter_campaign(&campaign),
    )
    .await;
    assert!(blocked.is_err(), "metering ran while the campaign was held");
    assert_eq!(h.stored_campaign(&campaign).total_spent, dec!(0));

    drop(guard);
    let report = h.engine.metering.meter_campaign(&campaign).await.unwrap();
    assert_eq!(report.total_settled(), dec!(50));
}
