//! Operator implementations for inbound adapters.

pub mod config;
pub mod entry;
pub mod ledger;
pub mod matching;
pub mod metering;

mod shared;
