//! Channel and reputation persistence.

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::codec::{decode, decode_money, decode_set, encode_money, encode_set, from_count, now, to_count};
use super::database::model::{ChannelRow, ReputationRow};
use super::database::schema::{channels, reputations};
use crate::domain::channel::{Channel, ChannelStatus, Reputation};
use crate::domain::id::{ChannelId, UserId};
use crate::error::{Error, Result};

fn from_rows(row: ChannelRow, reputation: Option<ReputationRow>) -> Result<Channel> {
    Ok(Channel {
        id: ChannelId::from(row.id),
        owner: UserId::from(row.owner_id),
        title: row.title,
        external_handle: row.external_handle,
        subscribers: u64::try_from(row.subscribers).unwrap_or(0),
        min_cpm: decode_money(&row.min_cpm)?,
        auto_publish: row.auto_publish,
        status: decode(&row.status)?,
        is_active: row.is_active,
        region: row.region,
        languages: decode_set(&row.languages)?,
        categories: decode_set(&row.categories)?,
        repost_preference: from_count(row.repost_preference),
        reputation: reputation.map(|r| Reputation {
            rating: r.rating,
            fraud_score: r.fraud_score,
            avg_engagement_rate: r.avg_engagement_rate,
        }),
    })
}

/// Insert a channel and, if present, its reputation.
///
/// # Errors
/// Returns an error if a row cannot be written.
pub fn insert_channel(conn: &mut SqliteConnection, channel: &Channel) -> Result<()> {
    let row = ChannelRow {
        id: channel.id.to_string(),
        owner_id: channel.owner.to_string(),
        title: channel.title.clone(),
        external_handle: channel.external_handle.clone(),
        subscribers: i64::try_from(channel.subscribers).unwrap_or(i64::MAX),
        min_cpm: encode_money(channel.min_cpm),
        auto_publish: channel.auto_publish,
        status: channel.status.as_str().to_string(),
        is_active: channel.is_active,
        region: channel.region.clone(),
        languages: encode_set(&channel.languages)?,
        categories: encode_set(&channel.categories)?,
        repost_preference: to_count(channel.repost_preference),
        created_at: now(),
    };
    diesel::insert_into(channels::table).values(&row).execute(conn)?;
    if let Some(reputation) = channel.reputation {
        upsert_reputation(conn, &channel.id, reputation)?;
    }
    Ok(())
}

/// Create or replace a channel's reputation record.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn upsert_reputation(
    conn: &mut SqliteConnection,
    channel: &ChannelId,
    reputation: Reputation,
) -> Result<()> {
    let row = ReputationRow {
        channel_id: channel.to_string(),
        rating: reputation.rating,
        fraud_score: reputation.fraud_score,
        avg_engagement_rate: reputation.avg_engagement_rate,
        updated_at: now(),
    };
    diesel::insert_into(reputations::table)
        .values(&row)
        .on_conflict(reputations::channel_id)
        .do_update()
        .set(&row)
        .execute(conn)?;
    Ok(())
}

/// Load a channel with its reputation.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such channel exists.
pub fn get_channel(conn: &mut SqliteConnection, id: &ChannelId) -> Result<Channel> {
    let found: Option<(ChannelRow, Option<ReputationRow>)> = channels::table
        .left_join(reputations::table)
        .filter(channels::id.eq(id.as_str()))
        .select((ChannelRow::as_select(), Option::<ReputationRow>::as_select()))
        .first(conn)
        .optional()?;
    let (row, reputation) = found.ok_or_else(|| Error::not_found("channel", id))?;
    from_rows(row, reputation)
}

/// Active, verified channels with their reputations.
///
/// Language, category and price filtering happens in the matcher.
///
/// # Errors
/// Returns an error on query failure.
pub fn listed_channels(conn: &mut SqliteConnection) -> Result<Vec<Channel>> {
    let rows: Vec<(ChannelRow, Option<ReputationRow>)> = channels::table
        .left_join(reputations::table)
        .filter(channels::is_active.eq(true))
        .filter(channels::status.eq(ChannelStatus::Verified.as_str()))
        .order(channels::created_at.asc())
        .select((ChannelRow::as_select(), Option::<ReputationRow>::as_select()))
        .load(conn)?;
    rows.into_iter()
        .map(|(row, reputation)| from_rows(row, reputation))
        .collect()
}
