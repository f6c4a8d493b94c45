//! Unified operator capability surface for inbound adapters.

use super::config::ConfigurationOperator;
use super::ledger::LedgerOperator;
use super::matching::MatchingOperator;
use super::metering::MeteringOperator;

/// Unified operator capability surface consumed by inbound adapters.
pub trait OperatorPort:
    ConfigurationOperator + LedgerOperator + MatchingOperator + MeteringOperator
{
}

impl<T> OperatorPort for T where
    T: ConfigurationOperator + LedgerOperator + MatchingOperator + MeteringOperator
{
}
