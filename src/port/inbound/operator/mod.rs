//! Operator-facing inbound ports consumed by CLI adapters.

pub mod config;
pub mod ledger;
pub mod matching;
pub mod metering;
pub mod port;
