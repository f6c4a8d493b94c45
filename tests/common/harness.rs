//! An [`Engine`] over scripted collaborators, plus seeding shortcuts.

use std::sync::Arc;

use chrono::NaiveDate;

use adzengine::adapter::outbound::sqlite::campaign::get_campaign;
use adzengine::adapter::outbound::sqlite::placement::get_placement;
use adzengine::adapter::outbound::sqlite::Database;
use adzengine::domain::campaign::Campaign;
use adzengine::domain::id::{CampaignId, EscrowId, PlacementId, UserId};
use adzengine::domain::ledger::BalanceKind;
use adzengine::domain::money::Money;
use adzengine::domain::placement::{Placement, PlacementStatus};
use adzengine::infrastructure::bootstrap::{Collaborators, Engine};
use adzengine::infrastructure::config::settings::Config;
use adzengine::port::MetricsSource;
use adzengine::testkit::config;
use adzengine::testkit::db::{save_campaign, seed_ad, seed_channel, seed_placement};
use adzengine::testkit::delivery::ScriptedDelivery;
use adzengine::testkit::domain::{self, ADVERTISER};
use adzengine::testkit::metrics::ScriptedMetrics;
use adzengine::testkit::notifier::RecordingNotifier;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

pub fn advertiser() -> UserId {
    UserId::from(ADVERTISER)
}

/// Owner of the channel seeded under `channel`.
pub fn owner(channel: &str) -> UserId {
    UserId::from(format!("owner-{channel}").as_str())
}

pub struct Harness {
    pub engine: Engine,
    pub delivery: Arc<ScriptedDelivery>,
    pub metrics: Arc<ScriptedMetrics>,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn in_memory() -> Self {
        Self::with_config(&config::in_memory(), ScriptedDelivery::new())
    }

    pub fn with_delivery(delivery: ScriptedDelivery) -> Self {
        Self::with_config(&config::in_memory(), delivery)
    }

    pub fn with_config(config: &Config, delivery: ScriptedDelivery) -> Self {
        let delivery = Arc::new(delivery);
        let metrics = Arc::new(ScriptedMetrics::new());
        let notifier = RecordingNotifier::new();
        let engine = Engine::build(
            config,
            Collaborators {
                delivery: delivery.clone(),
                metrics: metrics.clone(),
                notifier: Arc::new(notifier.clone()),
            },
        )
        .expect("build engine");
        Self {
            engine,
            delivery,
            metrics,
            notifier,
        }
    }

    /// In-memory engine whose metrics source is built by `wrap` around the
    /// scripted one, with access to the engine's database.
    pub fn with_metrics<F>(wrap: F) -> Self
    where
        F: FnOnce(Database, Arc<ScriptedMetrics>) -> Arc<dyn MetricsSource>,
    {
        let db = Database::open_in_memory().expect("open database");
        let delivery = Arc::new(ScriptedDelivery::new());
        let metrics = Arc::new(ScriptedMetrics::new());
        let notifier = RecordingNotifier::new();
        let engine = Engine::with_database(
            db.clone(),
            &config::in_memory(),
            Collaborators {
                delivery: delivery.clone(),
                metrics: wrap(db, metrics.clone()),
                notifier: Arc::new(notifier.clone()),
            },
        );
        Self {
            engine,
            delivery,
            metrics,
            notifier,
        }
    }

    /// Store `campaign` with one active ad, `ad-<campaign id>`.
    pub fn campaign(&self, campaign: Campaign) -> CampaignId {
        let mut conn = self.engine.db.connection().expect("connection");
        let id = campaign.id.clone();
        save_campaign(&mut conn, campaign);
        seed_ad(&mut conn, &format!("ad-{id}"), id.as_str());
        id
    }

    /// Default campaign `id` with the given budget.
    pub fn campaign_with_budget(&self, id: &str, budget: Money) -> CampaignId {
        let mut campaign = domain::campaign(id);
        campaign.initial_budget = budget;
        self.campaign(campaign)
    }

    /// A running placement `p-<channel>` on a new channel owned by
    /// `owner-<channel>`, already posted as `msg-<channel>`.
    pub fn running_placement(&self, campaign: &CampaignId, channel: &str) -> PlacementId {
        let mut conn = self.engine.db.connection().expect("connection");
        seed_channel(&mut conn, channel, owner(channel).as_str());
        let mut placement = domain::placement(
            &format!("p-{channel}"),
            &format!("ad-{campaign}"),
            channel,
            campaign.as_str(),
        );
        placement.status = PlacementStatus::Running;
        placement.content_platform_id = Some(format!("msg-{channel}"));
        seed_placement(&mut conn, placement).id
    }

    /// Deposit `amount` for the advertiser and lock it in a new escrow for
    /// `campaign`, assigning the owners of `channels`.
    pub fn fund(&self, campaign: &CampaignId, amount: Money, channels: &[&str]) -> EscrowId {
        let ledger = &self.engine.ledger;
        ledger
            .open_account(&advertiser(), BalanceKind::Advertiser)
            .expect("open account");
        ledger.deposit(&advertiser(), amount).expect("deposit");
        let escrow = ledger
            .create_campaign_escrow(&advertiser(), amount, campaign)
            .expect("create escrow");
        for channel in channels {
            ledger
                .assign_creator(&escrow.id, &owner(channel))
                .expect("assign creator");
        }
        escrow.id
    }

    pub fn stored_campaign(&self, id: &CampaignId) -> Campaign {
        let mut conn = self.engine.db.connection().expect("connection");
        get_campaign(&mut conn, id).expect("campaign")
    }

    pub fn stored_placement(&self, id: &PlacementId) -> Placement {
        let mut conn = self.engine.db.connection().expect("connection");
        get_placement(&mut conn, id).expect("placement")
    }
}
