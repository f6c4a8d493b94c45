//! Balance, transaction, escrow, withdrawal and audit persistence.
//!
//! These are row-level helpers; the ledger service composes them inside a
//! single [`Database::atomic`](super::Database::atomic) unit per operation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::codec::{decode, decode_money, decode_time, encode_money, encode_time, now};
use super::database::model::{
    AuditLogRow, BalanceRow, EscrowCreatorRow, EscrowRow, NewAuditLogRow, NewTransactionRow,
    TransactionRow, WithdrawalRow,
};
use super::database::schema::{
    audit_logs, balances, escrow_creators, escrows, transactions, withdrawals,
};
use crate::domain::id::{CampaignId, EscrowId, UserId, WithdrawalId};
use crate::domain::ledger::{
    Balance, BalanceKind, Buckets, Escrow, EscrowStatus, SubBalance, Transaction,
    TransactionKind, Withdrawal, WithdrawalStatus,
};
use crate::domain::money::Money;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

fn balance_from_row(row: BalanceRow) -> Result<Balance> {
    Ok(Balance {
        user: UserId::from(row.user_id),
        kind: decode(&row.kind)?,
        buckets: Buckets {
            available: decode_money(&row.available)?,
            escrow: decode_money(&row.escrow)?,
            pending_withdrawals: decode_money(&row.pending_withdrawals)?,
        },
    })
}

/// Load a balance.
///
/// # Errors
/// Returns an error on query failure.
pub fn find_balance(conn: &mut SqliteConnection, user: &UserId) -> Result<Option<Balance>> {
    balances::table
        .find(user.as_str())
        .select(BalanceRow::as_select())
        .first(conn)
        .optional()?
        .map(balance_from_row)
        .transpose()
}

/// Create an empty balance.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn insert_balance(conn: &mut SqliteConnection, user: &UserId, kind: BalanceKind) -> Result<Balance> {
    let stamp = now();
    let zero = encode_money(Money::ZERO);
    diesel::insert_into(balances::table)
        .values(&BalanceRow {
            user_id: user.to_string(),
            kind: kind.as_str().to_string(),
            available: zero.clone(),
            escrow: zero.clone(),
            pending_withdrawals: zero,
            created_at: stamp.clone(),
            updated_at: stamp,
        })
        .execute(conn)?;
    Ok(Balance {
        user: user.clone(),
        kind,
        buckets: Buckets::default(),
    })
}

/// Overwrite a balance's buckets.
///
/// # Errors
/// Returns [`Error::NotFound`] if the balance does not exist.
pub fn write_buckets(conn: &mut SqliteConnection, user: &UserId, buckets: &Buckets) -> Result<()> {
    let updated = diesel::update(balances::table.find(user.as_str()))
        .set((
            balances::available.eq(encode_money(buckets.available)),
            balances::escrow.eq(encode_money(buckets.escrow)),
            balances::pending_withdrawals.eq(encode_money(buckets.pending_withdrawals)),
            balances::updated_at.eq(now()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::not_found("balance", user));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

fn transaction_from_row(row: TransactionRow) -> Result<Transaction> {
    Ok(Transaction {
        id: row.id,
        kind: decode::<TransactionKind>(&row.kind)?,
        amount: decode_money(&row.amount)?,
        sub_balance: decode::<SubBalance>(&row.sub_balance)?,
        after_balance: decode_money(&row.after_balance)?,
        created_at: decode_time(&row.created_at)?,
        user: UserId::from(row.user_id),
        reference: row.reference,
    })
}

/// Append a ledger entry.
///
/// # Errors
/// Returns an error if the row cannot be written, including a reference
/// collision.
pub fn insert_transaction(
    conn: &mut SqliteConnection,
    user: &UserId,
    kind: TransactionKind,
    amount: Money,
    sub_balance: SubBalance,
    after_balance: Money,
    reference: &str,
) -> Result<()> {
    diesel::insert_into(transactions::table)
        .values(&NewTransactionRow {
            user_id: user.to_string(),
            kind: kind.as_str().to_string(),
            amount: encode_money(amount),
            sub_balance: sub_balance.as_str().to_string(),
            after_balance: encode_money(after_balance),
            reference: reference.to_string(),
            created_at: now(),
        })
        .execute(conn)?;
    Ok(())
}

/// Suffixes that distinguish the entries sharing one reference stem.
pub const REFERENCE_SUFFIXES: [&str; 3] = ["DEB", "CRE", "ADV"];

/// Whether `stem`, or `stem` with any of [`REFERENCE_SUFFIXES`], is
/// already a transaction reference.
///
/// Paired entries share a stem and differ by suffix, so a stem is taken
/// once any of its entries exists. Matching is exact.
///
/// # Errors
/// Returns an error on query failure.
pub fn reference_taken(conn: &mut SqliteConnection, stem: &str) -> Result<bool> {
    let mut candidates = vec![stem.to_string()];
    candidates.extend(REFERENCE_SUFFIXES.iter().map(|suffix| format!("{stem}-{suffix}")));

    let count: i64 = transactions::table
        .filter(transactions::reference.eq_any(candidates))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// A user's transactions in insertion order.
///
/// # Errors
/// Returns an error on query failure.
pub fn transactions_for(conn: &mut SqliteConnection, user: &UserId) -> Result<Vec<Transaction>> {
    let rows: Vec<TransactionRow> = transactions::table
        .filter(transactions::user_id.eq(user.as_str()))
        .order(transactions::id.asc())
        .select(TransactionRow::as_select())
        .load(conn)?;
    rows.into_iter().map(transaction_from_row).collect()
}

/// A user's most recent `limit` transactions, newest first.
///
/// # Errors
/// Returns an error on query failure.
pub fn recent_transactions(
    conn: &mut SqliteConnection,
    user: &UserId,
    limit: i64,
) -> Result<Vec<Transaction>> {
    let rows: Vec<TransactionRow> = transactions::table
        .filter(transactions::user_id.eq(user.as_str()))
        .order(transactions::id.desc())
        .limit(limit)
        .select(TransactionRow::as_select())
        .load(conn)?;
    rows.into_iter().map(transaction_from_row).collect()
}

// ---------------------------------------------------------------------------
// Escrows
// ---------------------------------------------------------------------------

fn assigned_creators(conn: &mut SqliteConnection, escrow: &str) -> Result<BTreeSet<UserId>> {
    let ids: Vec<String> = escrow_creators::table
        .filter(escrow_creators::escrow_id.eq(escrow))
        .select(escrow_creators::creator_id)
        .load(conn)?;
    Ok(ids.into_iter().map(UserId::from).collect())
}

fn escrow_from_row(conn: &mut SqliteConnection, row: EscrowRow) -> Result<Escrow> {
    let creators = assigned_creators(conn, &row.id)?;
    Ok(Escrow {
        amount: decode_money(&row.amount)?,
        remaining_amount: decode_money(&row.remaining_amount)?,
        status: decode(&row.status)?,
        id: EscrowId::from(row.id),
        advertiser: UserId::from(row.advertiser_id),
        campaign_id: CampaignId::from(row.campaign_id),
        assigned_creators: creators,
    })
}

/// Insert a new escrow with no assigned creators.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn insert_escrow(conn: &mut SqliteConnection, escrow: &Escrow) -> Result<()> {
    let stamp = now();
    diesel::insert_into(escrows::table)
        .values(&EscrowRow {
            id: escrow.id.to_string(),
            advertiser_id: escrow.advertiser.to_string(),
            campaign_id: escrow.campaign_id.to_string(),
            amount: encode_money(escrow.amount),
            remaining_amount: encode_money(escrow.remaining_amount),
            status: escrow.status.as_str().to_string(),
            created_at: stamp.clone(),
            updated_at: stamp,
        })
        .execute(conn)?;
    for creator in &escrow.assigned_creators {
        assign_creator(conn, &escrow.id, creator)?;
    }
    Ok(())
}

/// Load an escrow with its assigned creators.
///
/// # Errors
/// Returns an error on query failure.
pub fn find_escrow(conn: &mut SqliteConnection, id: &EscrowId) -> Result<Option<Escrow>> {
    let row: Option<EscrowRow> = escrows::table
        .find(id.as_str())
        .select(EscrowRow::as_select())
        .first(conn)
        .optional()?;
    row.map(|row| escrow_from_row(conn, row)).transpose()
}

/// A campaign's pending escrows, oldest first.
///
/// # Errors
/// Returns an error on query failure.
pub fn pending_escrows(conn: &mut SqliteConnection, campaign: &CampaignId) -> Result<Vec<Escrow>> {
    let rows: Vec<EscrowRow> = escrows::table
        .filter(escrows::campaign_id.eq(campaign.as_str()))
        .filter(escrows::status.eq(EscrowStatus::Pending.as_str()))
        .order((escrows::created_at.asc(), escrows::id.asc()))
        .select(EscrowRow::as_select())
        .load(conn)?;
    rows.into_iter().map(|row| escrow_from_row(conn, row)).collect()
}

/// The oldest pending escrow funding `campaign` from `advertiser` that
/// `creator` may draw from.
///
/// # Errors
/// Returns an error on query failure.
pub fn pending_escrow_for(
    conn: &mut SqliteConnection,
    advertiser: &UserId,
    campaign: &CampaignId,
    creator: &UserId,
) -> Result<Option<Escrow>> {
    let row: Option<EscrowRow> = escrows::table
        .inner_join(escrow_creators::table)
        .filter(escrows::advertiser_id.eq(advertiser.as_str()))
        .filter(escrows::campaign_id.eq(campaign.as_str()))
        .filter(escrows::status.eq(EscrowStatus::Pending.as_str()))
        .filter(escrow_creators::creator_id.eq(creator.as_str()))
        .order((escrows::created_at.asc(), escrows::id.asc()))
        .select(EscrowRow::as_select())
        .first(conn)
        .optional()?;
    row.map(|row| escrow_from_row(conn, row)).transpose()
}

/// Allow `creator` to draw from an escrow. Idempotent.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn assign_creator(conn: &mut SqliteConnection, escrow: &EscrowId, creator: &UserId) -> Result<()> {
    diesel::insert_or_ignore_into(escrow_creators::table)
        .values(&EscrowCreatorRow {
            escrow_id: escrow.to_string(),
            creator_id: creator.to_string(),
        })
        .execute(conn)?;
    Ok(())
}

/// Persist an escrow's remaining amount and status.
///
/// # Errors
/// Returns [`Error::NotFound`] if the escrow does not exist.
pub fn update_escrow(
    conn: &mut SqliteConnection,
    id: &EscrowId,
    remaining: Money,
    status: EscrowStatus,
) -> Result<()> {
    let updated = diesel::update(escrows::table.find(id.as_str()))
        .set((
            escrows::remaining_amount.eq(encode_money(remaining)),
            escrows::status.eq(status.as_str()),
            escrows::updated_at.eq(now()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::not_found("escrow", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Withdrawals
// ---------------------------------------------------------------------------

fn withdrawal_from_row(row: WithdrawalRow) -> Result<Withdrawal> {
    Ok(Withdrawal {
        amount: decode_money(&row.amount)?,
        status: decode(&row.status)?,
        created_at: decode_time(&row.created_at)?,
        approved_at: row.approved_at.as_deref().map(decode_time).transpose()?,
        completed_at: row.completed_at.as_deref().map(decode_time).transpose()?,
        id: WithdrawalId::from(row.id),
        user: UserId::from(row.user_id),
        reference: row.reference,
    })
}

/// Insert a withdrawal request.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn insert_withdrawal(conn: &mut SqliteConnection, withdrawal: &Withdrawal) -> Result<()> {
    diesel::insert_into(withdrawals::table)
        .values(&WithdrawalRow {
            id: withdrawal.id.to_string(),
            user_id: withdrawal.user.to_string(),
            amount: encode_money(withdrawal.amount),
            reference: withdrawal.reference.clone(),
            status: withdrawal.status.as_str().to_string(),
            created_at: encode_time(withdrawal.created_at),
            approved_at: withdrawal.approved_at.map(encode_time),
            completed_at: withdrawal.completed_at.map(encode_time),
        })
        .execute(conn)?;
    Ok(())
}

/// Load a withdrawal.
///
/// # Errors
/// Returns an error on query failure.
pub fn find_withdrawal(conn: &mut SqliteConnection, id: &WithdrawalId) -> Result<Option<Withdrawal>> {
    withdrawals::table
        .find(id.as_str())
        .select(WithdrawalRow::as_select())
        .first(conn)
        .optional()?
        .map(withdrawal_from_row)
        .transpose()
}

/// Persist a withdrawal's status and timestamps.
///
/// # Errors
/// Returns [`Error::NotFound`] if the withdrawal does not exist.
pub fn update_withdrawal(
    conn: &mut SqliteConnection,
    id: &WithdrawalId,
    status: WithdrawalStatus,
    approved_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let updated = diesel::update(withdrawals::table.find(id.as_str()))
        .set((
            withdrawals::status.eq(status.as_str()),
            withdrawals::approved_at.eq(approved_at.map(encode_time)),
            withdrawals::completed_at.eq(completed_at.map(encode_time)),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::not_found("withdrawal", id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub actor: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub description: String,
}

/// Append an audit entry.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn append_audit(conn: &mut SqliteConnection, entry: &AuditEntry) -> Result<()> {
    diesel::insert_into(audit_logs::table)
        .values(&NewAuditLogRow {
            actor: entry.actor.clone(),
            action: entry.action.clone(),
            target_type: entry.target_type.clone(),
            target_id: entry.target_id.clone(),
            description: entry.description.clone(),
            created_at: now(),
        })
        .execute(conn)?;
    Ok(())
}

/// Audit entries about `target_id`, in insertion order.
///
/// # Errors
/// Returns an error on query failure.
pub fn audit_trail(conn: &mut SqliteConnection, target_id: &str) -> Result<Vec<AuditEntry>> {
    let rows: Vec<AuditLogRow> = audit_logs::table
        .filter(audit_logs::target_id.eq(target_id))
        .order(audit_logs::id.asc())
        .select(AuditLogRow::as_select())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|row| AuditEntry {
            actor: row.actor,
            action: row.action,
            target_type: row.target_type,
            target_id: row.target_id,
            description: row.description,
        })
        .collect())
}
