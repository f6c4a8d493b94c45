//! Metering operator implementation.

use std::path::Path;

use crate::adapter::outbound::sqlite::performance::unsettled;
use crate::domain::performance::PerformanceRecord;
use crate::error::Result;
use crate::port::inbound::operator::metering::MeteringOperator;

use super::entry::Operator;
use super::shared::open;

impl MeteringOperator for Operator {
    fn unsettled(&self, path: &Path) -> Result<Vec<PerformanceRecord>> {
        let (_config, db) = open(path)?;
        let mut conn = db.connection()?;
        unsettled(&mut conn)
    }
}
