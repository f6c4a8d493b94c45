//! Campaign and ad persistence.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::codec::{
    decode, decode_date, decode_money, decode_set, encode_date, encode_money, encode_set, now,
};
use super::database::model::{AdRow, CampaignRow};
use super::database::schema::{ads, campaigns};
use crate::domain::campaign::{Ad, Campaign, CampaignStatus, Targeting};
use crate::domain::id::{AdId, CampaignId, UserId};
use crate::domain::money::Money;
use crate::error::{Error, Result};

fn to_row(campaign: &Campaign) -> Result<CampaignRow> {
    let stamp = now();
    Ok(CampaignRow {
        id: campaign.id.to_string(),
        advertiser_id: campaign.advertiser.to_string(),
        name: campaign.name.clone(),
        objective: campaign.objective.as_str().to_string(),
        cpm: encode_money(campaign.cpm),
        initial_budget: encode_money(campaign.initial_budget),
        total_spent: encode_money(campaign.total_spent),
        status: campaign.status.as_str().to_string(),
        target_languages: encode_set(&campaign.targeting.languages)?,
        target_categories: encode_set(&campaign.targeting.categories)?,
        target_regions: encode_set(&campaign.targeting.regions)?,
        start_date: campaign.start_date.map(encode_date),
        end_date: campaign.end_date.map(encode_date),
        created_at: stamp.clone(),
        updated_at: stamp,
    })
}

fn from_row(row: CampaignRow) -> Result<Campaign> {
    Ok(Campaign {
        id: CampaignId::from(row.id),
        advertiser: UserId::from(row.advertiser_id),
        name: row.name,
        objective: decode(&row.objective)?,
        cpm: decode_money(&row.cpm)?,
        initial_budget: decode_money(&row.initial_budget)?,
        total_spent: decode_money(&row.total_spent)?,
        status: decode(&row.status)?,
        targeting: Targeting {
            languages: decode_set(&row.target_languages)?,
            categories: decode_set(&row.target_categories)?,
            regions: decode_set(&row.target_regions)?,
        },
        start_date: row.start_date.as_deref().map(decode_date).transpose()?,
        end_date: row.end_date.as_deref().map(decode_date).transpose()?,
    })
}

fn ad_from_row(row: AdRow) -> Ad {
    Ad {
        id: AdId::from(row.id),
        campaign_id: CampaignId::from(row.campaign_id),
        headline: row.headline,
        body: row.body,
        is_active: row.is_active,
    }
}

/// Insert a new campaign.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn insert_campaign(conn: &mut SqliteConnection, campaign: &Campaign) -> Result<()> {
    diesel::insert_into(campaigns::table)
        .values(&to_row(campaign)?)
        .execute(conn)?;
    Ok(())
}

/// Insert a new ad.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn insert_ad(conn: &mut SqliteConnection, ad: &Ad) -> Result<()> {
    diesel::insert_into(ads::table)
        .values(&AdRow {
            id: ad.id.to_string(),
            campaign_id: ad.campaign_id.to_string(),
            headline: ad.headline.clone(),
            body: ad.body.clone(),
            is_active: ad.is_active,
            created_at: now(),
        })
        .execute(conn)?;
    Ok(())
}

/// Load a campaign.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such campaign exists.
pub fn get_campaign(conn: &mut SqliteConnection, id: &CampaignId) -> Result<Campaign> {
    let row: Option<CampaignRow> = campaigns::table
        .find(id.as_str())
        .select(CampaignRow::as_select())
        .first(conn)
        .optional()?;
    row.map(from_row)
        .transpose()?
        .ok_or_else(|| Error::not_found("campaign", id))
}

/// Ads of a campaign currently marked active.
///
/// # Errors
/// Returns an error on query failure.
pub fn active_ads(conn: &mut SqliteConnection, id: &CampaignId) -> Result<Vec<Ad>> {
    let rows: Vec<AdRow> = ads::table
        .filter(ads::campaign_id.eq(id.as_str()))
        .filter(ads::is_active.eq(true))
        .order(ads::created_at.asc())
        .select(AdRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(ad_from_row).collect())
}

/// Load an ad.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such ad exists.
pub fn get_ad(conn: &mut SqliteConnection, id: &AdId) -> Result<Ad> {
    ads::table
        .find(id.as_str())
        .select(AdRow::as_select())
        .first(conn)
        .optional()?
        .map(ad_from_row)
        .ok_or_else(|| Error::not_found("ad", id))
}

/// Set a campaign's status.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such campaign exists.
pub fn set_campaign_status(
    conn: &mut SqliteConnection,
    id: &CampaignId,
    status: CampaignStatus,
) -> Result<()> {
    let updated = diesel::update(campaigns::table.find(id.as_str()))
        .set((
            campaigns::status.eq(status.as_str()),
            campaigns::updated_at.eq(now()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::not_found("campaign", id));
    }
    Ok(())
}

/// Set a campaign's start date.
///
/// # Errors
/// Returns an error on query failure.
pub fn set_start_date(conn: &mut SqliteConnection, id: &CampaignId, date: NaiveDate) -> Result<()> {
    diesel::update(campaigns::table.find(id.as_str()))
        .set((
            campaigns::start_date.eq(Some(encode_date(date))),
            campaigns::updated_at.eq(now()),
        ))
        .execute(conn)?;
    Ok(())
}

/// Add `amount` to a campaign's `total_spent`, returning the new total.
///
/// # Errors
/// Returns [`Error::NotFound`] if no such campaign exists.
pub fn add_spend(conn: &mut SqliteConnection, id: &CampaignId, amount: Money) -> Result<Money> {
    let current: String = campaigns::table
        .find(id.as_str())
        .select(campaigns::total_spent)
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::not_found("campaign", id))?;
    let total = decode_money(&current)? + amount;
    diesel::update(campaigns::table.find(id.as_str()))
        .set((
            campaigns::total_spent.eq(encode_money(total)),
            campaigns::updated_at.eq(now()),
        ))
        .execute(conn)?;
    Ok(total)
}
