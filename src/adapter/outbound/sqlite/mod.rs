//! SQLite persistence adapters.
//!
//! Row-level store functions over a `&mut SqliteConnection`, so callers can
//! compose several of them inside one [`Database::atomic`] unit.

mod codec;
pub mod database;

pub mod campaign;
pub mod channel;
pub mod ledger;
pub mod match_log;
pub mod performance;
pub mod placement;

pub use database::Database;
