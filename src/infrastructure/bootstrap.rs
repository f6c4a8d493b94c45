//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::sqlite::Database;
use crate::application::allocator::PlacementAllocator;
use crate::application::ledger::LedgerService;
use crate::application::lock::CampaignLocks;
use crate::application::matcher::ChannelMatcher;
use crate::application::metering::MeteringEngine;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{Delivery, LogNotifier, MetricsSource, Notifier, NotifierRegistry};

/// SQLite URL that selects a private in-memory database.
pub const MEMORY_URL: &str = ":memory:";

/// Open and migrate the configured database.
///
/// # Errors
/// Returns an error if the pool cannot be built or migrations fail.
pub fn open_database(config: &Config) -> Result<Database> {
    let db = if config.database.url == MEMORY_URL {
        Database::open_in_memory()?
    } else {
        Database::open(&config.database.url, config.database.pool_size)?
    };
    info!(database = %config.database.url, "Database initialized");
    Ok(db)
}

/// Notifier registry with the logging notifier installed.
#[must_use]
pub fn build_notifier_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// External collaborators the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub delivery: Arc<dyn Delivery>,
    pub metrics: Arc<dyn MetricsSource>,
    pub notifier: Arc<dyn Notifier>,
}

/// Every service, wired to one database and one lock table.
pub struct Engine {
    pub db: Database,
    pub ledger: LedgerService,
    pub matcher: ChannelMatcher,
    pub allocator: PlacementAllocator,
    pub metering: Arc<MeteringEngine>,
    pub locks: CampaignLocks,
}

impl Engine {
    /// Open the configured database and wire the services.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn build(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let db = open_database(config)?;
        Ok(Self::with_database(db, config, collaborators))
    }

    /// Wire the services over an already open database.
    #[must_use]
    pub fn with_database(db: Database, config: &Config, collaborators: Collaborators) -> Self {
        let locks = CampaignLocks::new();
        let ledger = LedgerService::new(db.clone(), config.ledger.clone());
        let matcher = ChannelMatcher::new(db.clone(), config.matching.clone());
        let allocator = PlacementAllocator::new(
            db.clone(),
            config.matching.clone(),
            Arc::clone(&collaborators.delivery),
            Arc::clone(&collaborators.notifier),
            locks.clone(),
        );
        let metering = Arc::new(MeteringEngine::new(
            ledger.clone(),
            collaborators.metrics,
            collaborators.delivery,
            collaborators.notifier,
            locks.clone(),
            config.metering.clone(),
        ));
        Self {
            db,
            ledger,
            matcher,
            allocator,
            metering,
            locks,
        }
    }
}
