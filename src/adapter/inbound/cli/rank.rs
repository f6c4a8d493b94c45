//! Channel ranking for a stored campaign.

use std::path::Path;

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::money::format_money;
use crate::error::Result;
use crate::port::inbound::operator::matching::RankedChannelView;
use crate::port::inbound::operator::port::OperatorPort;

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Channel")]
    title: String,
    #[tabled(rename = "Subscribers")]
    subscribers: u64,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Est. Cost")]
    cost: String,
}

fn rows(ranked: &[RankedChannelView]) -> Vec<RankRow> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, r)| RankRow {
            position: i + 1,
            title: r.title.clone(),
            subscribers: r.subscribers,
            score: format!("{:.2}", r.score),
            cost: format_money(r.estimated_cost),
        })
        .collect()
}

/// Execute `rank`.
pub fn execute(
    operator: &dyn OperatorPort,
    config_path: &Path,
    campaign: &str,
    top_n: Option<usize>,
) -> Result<()> {
    let ranked = operator.rank(config_path, campaign, top_n)?;

    if output::is_json() {
        let channels: Vec<_> = ranked
            .iter()
            .map(|r| {
                json!({
                    "channel_id": r.channel_id,
                    "title": r.title,
                    "subscribers": r.subscribers,
                    "score": r.score,
                    "estimated_cost": r.estimated_cost.to_string(),
                })
            })
            .collect();
        output::json_output(json!({
            "command": "rank",
            "campaign_id": campaign,
            "channels": channels,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(&format!("Ranked channels for {campaign}"));
    if ranked.is_empty() {
        output::warning("No eligible channels");
        return Ok(());
    }
    output::lines(&Table::new(rows(&ranked)).to_string());
    Ok(())
}
