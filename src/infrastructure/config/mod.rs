//! Infrastructure configuration modules.

pub mod ledger;
pub mod logging;
pub mod matching;
pub mod metering;
pub mod settings;
