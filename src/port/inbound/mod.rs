//! Inbound (driving) ports consumed by inbound adapters.
//!
//! - [`operator`]: Operator-facing use cases for configuration, matching,
//!   ledger inspection and metering reconciliation
pub mod operator;
