//! Database model types for Diesel ORM.
//!
//! Money columns hold canonical two-decimal text; timestamps hold RFC 3339
//! text; target sets hold JSON arrays.

use diesel::prelude::*;

use super::schema::{
    ads, audit_logs, balances, campaigns, channels, escrow_creators, escrows, match_logs,
    performance_records, placements, reputations, transactions, withdrawals,
};

/// Database row for a campaign.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = campaigns)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CampaignRow {
    pub id: String,
    pub advertiser_id: String,
    pub name: String,
    pub objective: String,
    pub cpm: String,
    pub initial_budget: String,
    pub total_spent: String,
    pub status: String,
    pub target_languages: String,
    pub target_categories: String,
    pub target_regions: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for an ad.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = ads)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AdRow {
    pub id: String,
    pub campaign_id: String,
    pub headline: String,
    pub body: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Database row for a channel.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = channels)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub external_handle: String,
    pub subscribers: i64,
    pub min_cpm: String,
    pub auto_publish: bool,
    pub status: String,
    pub is_active: bool,
    pub region: String,
    pub languages: String,
    pub categories: String,
    pub repost_preference: i32,
    pub created_at: String,
}

/// Database row for a channel reputation.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = reputations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReputationRow {
    pub channel_id: String,
    pub rating: f64,
    pub fraud_score: f64,
    pub avg_engagement_rate: f64,
    pub updated_at: String,
}

/// Database row for a placement.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = placements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlacementRow {
    pub id: String,
    pub ad_id: String,
    pub channel_id: String,
    pub campaign_id: String,
    pub status: String,
    pub preference_score: f64,
    pub winning_bid_price: String,
    pub content_platform_id: Option<String>,
    pub repost_count: i32,
    pub max_reposts: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Mutable placement columns.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = placements)]
#[diesel(treat_none_as_null = true)]
pub struct PlacementChanges {
    pub status: String,
    pub preference_score: f64,
    pub winning_bid_price: String,
    pub content_platform_id: Option<String>,
    pub repost_count: i32,
    pub max_reposts: i32,
    pub updated_at: String,
}

/// Database row for a performance record.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = performance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PerformanceRecordRow {
    pub id: String,
    pub placement_id: String,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub reposts: i64,
    pub reactions: i64,
    pub replies: i64,
    pub views: i64,
    pub forwards: i64,
    pub cost: String,
    pub is_deducted: bool,
    pub recorded_at: String,
}

/// Database row for an escrow.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = escrows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EscrowRow {
    pub id: String,
    pub advertiser_id: String,
    pub campaign_id: String,
    pub amount: String,
    pub remaining_amount: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row linking a creator to an escrow.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = escrow_creators)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EscrowCreatorRow {
    pub escrow_id: String,
    pub creator_id: String,
}

/// Database row for a balance.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = balances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BalanceRow {
    pub user_id: String,
    pub kind: String,
    pub available: String,
    pub escrow: String,
    pub pending_withdrawals: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for a transaction (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = transactions)]
pub struct NewTransactionRow {
    pub user_id: String,
    pub kind: String,
    pub amount: String,
    pub sub_balance: String,
    pub after_balance: String,
    pub reference: String,
    pub created_at: String,
}

/// Database row for a transaction (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRow {
    pub id: i64,
    pub user_id: String,
    pub kind: String,
    pub amount: String,
    pub sub_balance: String,
    pub after_balance: String,
    pub reference: String,
    pub created_at: String,
}

/// Database row for a match log entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = match_logs)]
pub struct NewMatchLogRow {
    pub campaign_id: String,
    pub placement_id: String,
    pub stage: String,
    pub reason: String,
    pub estimated_cost: String,
    pub created_at: String,
}

/// Database row for a match log entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = match_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MatchLogRow {
    pub id: i64,
    pub campaign_id: String,
    pub placement_id: String,
    pub stage: String,
    pub reason: String,
    pub estimated_cost: String,
    pub created_at: String,
}

/// Database row for a withdrawal.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = withdrawals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WithdrawalRow {
    pub id: String,
    pub user_id: String,
    pub amount: String,
    pub reference: String,
    pub status: String,
    pub created_at: String,
    pub approved_at: Option<String>,
    pub completed_at: Option<String>,
}

/// Database row for an audit log entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditLogRow {
    pub actor: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub description: String,
    pub created_at: String,
}

/// Database row for an audit log entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = audit_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditLogRow {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub description: String,
    pub created_at: String,
}
