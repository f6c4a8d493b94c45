//! Placement persistence.

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::codec::{decode, decode_money, encode_money, from_count, now, to_count};
use super::database::model::{PlacementChanges, PlacementRow};
use super::database::schema::placements;
use crate::domain::id::{AdId, CampaignId, ChannelId, PlacementId};
use crate::domain::placement::{Placement, PlacementStatus};
use crate::error::{Error, Result};

fn from_row(row: PlacementRow) -> Result<Placement> {
    Ok(Placement {
        id: PlacementId::from(row.id),
        ad_id: AdId::from(row.ad_id),
        channel_id: ChannelId::from(row.channel_id),
        campaign_id: CampaignId::from(row.campaign_id),
        status: decode(&row.status)?,
        preference_score: row.preference_score,
        winning_bid_price: decode_money(&row.winning_bid_price)?,
        content_platform_id: row.content_platform_id,
        repost_count: from_count(row.repost_count),
        max_reposts: from_count(row.max_reposts),
    })
}

fn status_names(statuses: &[PlacementStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

/// Insert a new placement.
///
/// # Errors
/// Returns an error if the row cannot be written, including when the
/// (ad, channel) pair already has a placement.
pub fn insert_placement(conn: &mut SqliteConnection, placement: &Placement) -> Result<()> {
    let stamp = now();
    diesel::insert_into(placements::table)
        .values(&PlacementRow {
            id: placement.id.to_string(),
            ad_id: placement.ad_id.to_string(),
            channel_id: placement.channel_id.to_string(),
            campaign_id: placement.campaign_id.to_string(),
            status: placement.status.as_str().to_string(),
            preference_score: placement.preference_score,
            winning_bid_price: encode_money(placement.winning_bid_price),
            content_platform_id: placement.content_platform_id.clone(),
            repost_count: to_count(placement.repost_count),
            max_reposts: to_count(placement.max_reposts),
            created_at: stamp.clone(),
            updated_at: stamp,
        })
        .execute(conn)?;
    Ok(())
}

/// Persist every mutable field of `placement`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the placement does not exist.
pub fn save_placement(conn: &mut SqliteConnection, placement: &Placement) -> Result<()> {
    let updated = diesel::update(placements::table.find(placement.id.as_str()))
        .set(&PlacementChanges {
            status: placement.status.as_str().to_string(),
            preference_score: placement.preference_score,
            winning_bid_price: encode_money(placement.winning_bid_price),
            content_platform_id: placement.content_platform_id.clone(),
            repost_count: to_count(placement.repost_count),
            max_reposts: to_count(placement.max_reposts),
            updated_at: now(),
        })
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::not_found("placement", &placement.id));
    }
    Ok(())
}

/// Load a placement.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such placement exists.
pub fn get_placement(conn: &mut SqliteConnection, id: &PlacementId) -> Result<Placement> {
    placements::table
        .find(id.as_str())
        .select(PlacementRow::as_select())
        .first(conn)
        .optional()?
        .map(from_row)
        .transpose()?
        .ok_or_else(|| Error::not_found("placement", id))
}

/// The placement for an (ad, channel) pair, if any.
///
/// # Errors
/// Returns an error on query failure.
pub fn find_by_pair(
    conn: &mut SqliteConnection,
    ad: &AdId,
    channel: &ChannelId,
) -> Result<Option<Placement>> {
    placements::table
        .filter(placements::ad_id.eq(ad.as_str()))
        .filter(placements::channel_id.eq(channel.as_str()))
        .select(PlacementRow::as_select())
        .first(conn)
        .optional()?
        .map(from_row)
        .transpose()
}

/// A campaign's placements in any of `statuses`, oldest first.
///
/// # Errors
/// Returns an error on query failure.
pub fn by_campaign(
    conn: &mut SqliteConnection,
    campaign: &CampaignId,
    statuses: &[PlacementStatus],
) -> Result<Vec<Placement>> {
    let rows: Vec<PlacementRow> = placements::table
        .filter(placements::campaign_id.eq(campaign.as_str()))
        .filter(placements::status.eq_any(status_names(statuses)))
        .order((placements::created_at.asc(), placements::id.asc()))
        .select(PlacementRow::as_select())
        .load(conn)?;
    rows.into_iter().map(from_row).collect()
}

/// Campaigns having at least one placement in any of `statuses`.
///
/// # Errors
/// Returns an error on query failure.
pub fn campaigns_with(
    conn: &mut SqliteConnection,
    statuses: &[PlacementStatus],
) -> Result<Vec<CampaignId>> {
    let ids: Vec<String> = placements::table
        .filter(placements::status.eq_any(status_names(statuses)))
        .select(placements::campaign_id)
        .distinct()
        .order(placements::campaign_id.asc())
        .load(conn)?;
    Ok(ids.into_iter().map(CampaignId::from).collect())
}

/// Number of placements of a campaign.
///
/// # Errors
/// Returns an error on query failure.
pub fn count_for_campaign(conn: &mut SqliteConnection, campaign: &CampaignId) -> Result<i64> {
    Ok(placements::table
        .filter(placements::campaign_id.eq(campaign.as_str()))
        .count()
        .get_result(conn)?)
}
