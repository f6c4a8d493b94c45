//! Match log persistence. Append-only.

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::codec::{decode_money, decode_time, encode_money, encode_time};
use super::database::model::{MatchLogRow, NewMatchLogRow};
use super::database::schema::match_logs;
use crate::domain::id::{CampaignId, PlacementId};
use crate::domain::match_log::{MatchLog, MatchStage};
use crate::error::{Error, Result};

fn stage_from(text: &str) -> Result<MatchStage> {
    match text {
        "initial_match" => Ok(MatchStage::InitialMatch),
        "activated" => Ok(MatchStage::Activated),
        other => Err(Error::Parse(format!("match stage '{other}'"))),
    }
}

/// Append an entry.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn append(conn: &mut SqliteConnection, entry: &MatchLog) -> Result<()> {
    diesel::insert_into(match_logs::table)
        .values(&NewMatchLogRow {
            campaign_id: entry.campaign_id.to_string(),
            placement_id: entry.placement_id.to_string(),
            stage: entry.stage.as_str().to_string(),
            reason: entry.reason.clone(),
            estimated_cost: encode_money(entry.estimated_cost),
            created_at: encode_time(entry.created_at),
        })
        .execute(conn)?;
    Ok(())
}

/// Entries for a campaign in insertion order.
///
/// # Errors
/// Returns an error on query failure.
pub fn for_campaign(conn: &mut SqliteConnection, campaign: &CampaignId) -> Result<Vec<MatchLog>> {
    let rows: Vec<MatchLogRow> = match_logs::table
        .filter(match_logs::campaign_id.eq(campaign.as_str()))
        .order(match_logs::id.asc())
        .select(MatchLogRow::as_select())
        .load(conn)?;
    rows.into_iter()
        .map(|row| {
            Ok(MatchLog {
                stage: stage_from(&row.stage)?,
                estimated_cost: decode_money(&row.estimated_cost)?,
                created_at: decode_time(&row.created_at)?,
                campaign_id: CampaignId::from(row.campaign_id),
                placement_id: PlacementId::from(row.placement_id),
                reason: row.reason,
            })
        })
        .collect()
}
