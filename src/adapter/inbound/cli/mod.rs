//! CLI module graph.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod ledger;
pub mod migrate;
pub mod output;
pub mod rank;
pub mod reconcile;
