//! Handler for the `reconcile` command.
//!
//! Lists metering records that carry a cost but were never marked deducted.
//! A completed settlement marks its record in the same unit, so any row
//! listed here belongs to a settlement that was abandoned or interrupted.

use std::path::Path;

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::money::format_money;
use crate::error::Result;
use crate::port::inbound::operator::port::OperatorPort;

#[derive(Tabled)]
struct UnsettledRow {
    #[tabled(rename = "Record")]
    record: String,
    #[tabled(rename = "Placement")]
    placement: String,
    #[tabled(rename = "Impressions")]
    impressions: i64,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Recorded")]
    recorded_at: String,
}

/// Execute `reconcile`.
pub fn execute(operator: &dyn OperatorPort, config_path: &Path) -> Result<()> {
    let records = operator.unsettled(config_path)?;

    if output::is_json() {
        let rows: Vec<_> = records
            .iter()
            .map(|r| {
                json!({
                    "record_id": r.id.as_str(),
                    "placement_id": r.placement_id.as_str(),
                    "impressions": r.counters.impressions,
                    "cost": r.cost.to_string(),
                    "recorded_at": r.recorded_at.to_rfc3339(),
                })
            })
            .collect();
        output::json_output(json!({
            "command": "reconcile",
            "unsettled": rows,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    if records.is_empty() {
        output::success("Every billable record is settled");
        return Ok(());
    }

    output::warning(&format!("{} unsettled record(s)", records.len()));
    let rows: Vec<UnsettledRow> = records
        .iter()
        .map(|r| UnsettledRow {
            record: r.id.to_string(),
            placement: r.placement_id.to_string(),
            impressions: r.counters.impressions,
            cost: format_money(r.cost),
            recorded_at: r.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
