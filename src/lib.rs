//! Adzengine - allocation and metered billing for an advertising marketplace.
//!
//! Advertisers fund campaigns into escrow, the engine ranks and reserves
//! creator channels for each campaign, publishes ads through a delivery
//! collaborator, and on a recurring cycle turns observed impressions into
//! ledger settlements between advertiser and creator balances.
//!
//! # Architecture
//!
//! - [`domain`] - Campaigns, channels, placements, money and ledger types
//! - [`port`] - Traits for delivery, metrics and notification collaborators
//! - [`application`] - Matching, allocation, ledger and metering services
//! - [`adapter`] - SQLite persistence and the operator CLI
//! - [`infrastructure`] - Configuration, wiring and the metering scheduler
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use adzengine::infrastructure::config::settings::Config;
//! use adzengine::infrastructure::bootstrap::open_database;
//! use adzengine::application::LedgerService;
//!
//! fn main() -> adzengine::error::Result<()> {
//!     let config = Config::load("config.toml")?;
//!     let db = open_database(&config)?;
//!     let ledger = LedgerService::new(db, config.ledger.clone());
//!     let balance = ledger.balance(&"advertiser-1".into())?;
//!     println!("{}", balance.total());
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
