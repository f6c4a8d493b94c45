//! Metering reconciliation projection for operator-facing adapters.

use std::path::Path;

use crate::domain::performance::PerformanceRecord;
use crate::error::Result;

/// Metering use-cases.
pub trait MeteringOperator {
    /// Billable records never marked deducted, oldest first.
    ///
    /// # Errors
    /// Returns an error on storage failure.
    fn unsettled(&self, path: &Path) -> Result<Vec<PerformanceRecord>>;
}
