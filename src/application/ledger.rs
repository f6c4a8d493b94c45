//! Double-entry ledger over per-user balances.
//!
//! Every operation runs as one [`Database::atomic`] unit: bucket updates, the
//! transaction rows recording them, escrow and withdrawal state, and the audit
//! entry either all commit or none do. Each bucket mutation writes exactly one
//! transaction row carrying the bucket's post-mutation value, so replaying a
//! user's transactions from zero reproduces the live balance.

use std::collections::BTreeSet;

use chrono::Utc;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::reference::{self, Prefix};
use crate::adapter::outbound::sqlite::campaign::get_campaign;
use crate::adapter::outbound::sqlite::ledger::{
    append_audit, assign_creator, find_balance, find_escrow, find_withdrawal, insert_balance,
    insert_escrow, insert_transaction, insert_withdrawal, recent_transactions, reference_taken,
    transactions_for, update_escrow, update_withdrawal, write_buckets, AuditEntry,
};
use crate::adapter::outbound::sqlite::Database;
use crate::domain::id::{CampaignId, EscrowId, UserId, WithdrawalId};
use crate::domain::ledger::{
    replay, Balance, BalanceKind, Buckets, Escrow, EscrowStatus, SubBalance, Transaction,
    TransactionKind, Withdrawal, WithdrawalStatus,
};
use crate::domain::money::{format_money, round_money, Money};
use crate::error::{LedgerError, Result};
use crate::infrastructure::config::ledger::LedgerConfig;

const SYSTEM_ACTOR: &str = "system";

/// Outcome of a single-account operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Reference stem shared by the entries the operation wrote.
    pub reference: String,
    /// Buckets after the operation.
    pub balance: Buckets,
}

/// Outcome of [`LedgerService::record_earning`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Earning {
    pub reference: String,
    /// Debited from the advertiser's escrow bucket.
    pub amount: Money,
    /// Credited to the creator's escrow bucket.
    pub creator_share: Money,
    /// Escrow state after the draw.
    pub escrow: Escrow,
}

/// Ledger service.
#[derive(Clone)]
pub struct LedgerService {
    db: Database,
    config: LedgerConfig,
}

fn positive(amount: Money) -> Result<Money> {
    let amount = round_money(amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount).into());
    }
    Ok(amount)
}

fn account(conn: &mut SqliteConnection, user: &UserId) -> Result<Balance> {
    find_balance(conn, user)?.ok_or_else(|| LedgerError::AccountNotFound(user.to_string()).into())
}

fn account_or_open(conn: &mut SqliteConnection, user: &UserId, kind: BalanceKind) -> Result<Balance> {
    match find_balance(conn, user)? {
        Some(balance) => Ok(balance),
        None => insert_balance(conn, user, kind),
    }
}

fn ensure_covers(balance: &Balance, bucket: SubBalance, amount: Money) -> Result<()> {
    let held = balance.buckets.get(bucket);
    if amount > held {
        return Err(LedgerError::InsufficientFunds {
            user: balance.user.to_string(),
            requested: amount,
            available: held,
        }
        .into());
    }
    Ok(())
}

/// Apply one entry to `balance` in memory and record it.
fn post(
    conn: &mut SqliteConnection,
    balance: &mut Balance,
    kind: TransactionKind,
    bucket: SubBalance,
    amount: Money,
    reference: &str,
) -> Result<Money> {
    let after = balance.buckets.apply(bucket, kind.signed(amount));
    insert_transaction(conn, &balance.user, kind, amount, bucket, after, reference)?;
    Ok(after)
}

/// Move `amount` between two buckets of one balance as a debit/credit pair.
fn transfer(
    conn: &mut SqliteConnection,
    balance: &mut Balance,
    from: SubBalance,
    to: SubBalance,
    amount: Money,
    stem: &str,
) -> Result<()> {
    post(conn, balance, TransactionKind::Debit, from, amount, &format!("{stem}-DEB"))?;
    post(conn, balance, TransactionKind::Credit, to, amount, &format!("{stem}-CRE"))?;
    write_buckets(conn, &balance.user, &balance.buckets)
}

fn audit(
    conn: &mut SqliteConnection,
    actor: &str,
    action: &str,
    target_type: &str,
    target_id: &str,
    description: String,
) -> Result<()> {
    append_audit(
        conn,
        &AuditEntry {
            actor: actor.to_string(),
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id: target_id.to_string(),
            description,
        },
    )
}

fn load_escrow(conn: &mut SqliteConnection, id: &EscrowId) -> Result<Escrow> {
    find_escrow(conn, id)?.ok_or_else(|| LedgerError::EscrowNotFound(id.to_string()).into())
}

fn load_withdrawal(conn: &mut SqliteConnection, id: &WithdrawalId) -> Result<Withdrawal> {
    find_withdrawal(conn, id)?.ok_or_else(|| LedgerError::WithdrawalNotFound(id.to_string()).into())
}

fn expect_withdrawal(withdrawal: &Withdrawal, status: WithdrawalStatus, action: &'static str) -> Result<()> {
    if withdrawal.status != status {
        return Err(LedgerError::InvalidStateTransition {
            entity: "withdrawal",
            id: withdrawal.id.to_string(),
            status: withdrawal.status.to_string(),
            action,
        }
        .into());
    }
    Ok(())
}

impl LedgerService {
    #[must_use]
    pub const fn new(db: Database, config: LedgerConfig) -> Self {
        Self { db, config }
    }

    /// Fraction withheld from every earning.
    #[must_use]
    pub const fn platform_fee(&self) -> Decimal {
        self.config.platform_fee
    }

    /// Tries allowed when drawing a unique reference.
    #[must_use]
    pub const fn reference_attempts(&self) -> u32 {
        self.config.reference_attempts
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Create an empty balance for `user`, or return the existing one.
    ///
    /// # Errors
    /// Returns an error on storage failure.
    pub fn open_account(&self, user: &UserId, kind: BalanceKind) -> Result<Balance> {
        self.db.atomic(|conn| account_or_open(conn, user, kind))
    }

    /// Current balance.
    ///
    /// # Errors
    /// Returns [`LedgerError::AccountNotFound`] if the user has no balance.
    pub fn balance(&self, user: &UserId) -> Result<Balance> {
        let mut conn = self.db.connection()?;
        account(&mut conn, user)
    }

    /// Most recent `limit` transactions, newest first.
    ///
    /// # Errors
    /// Returns an error on query failure.
    pub fn transactions(&self, user: &UserId, limit: usize) -> Result<Vec<Transaction>> {
        let mut conn = self.db.connection()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        recent_transactions(&mut conn, user, limit)
    }

    /// Credit `available`.
    ///
    /// # Errors
    /// Returns [`LedgerError::AccountNotFound`] or
    /// [`LedgerError::NonPositiveAmount`].
    pub fn deposit(&self, user: &UserId, amount: Money) -> Result<Receipt> {
        let amount = positive(amount)?;
        let receipt = self.db.atomic(|conn| {
            let stem = reference::unique(conn, Prefix::Deposit, self.config.reference_attempts)?;
            self.deposit_in(conn, user, amount, stem, "deposit")
        })?;
        info!(user = %user, amount = %amount, reference = %receipt.reference, "Deposit recorded");
        Ok(receipt)
    }

    /// Credit `available` under an externally supplied reference, such as a
    /// payment processor's confirmation id.
    ///
    /// # Errors
    /// Returns [`LedgerError::DuplicateReference`] if the reference was
    /// already used.
    pub fn confirm_deposit(&self, user: &UserId, amount: Money, reference: &str) -> Result<Receipt> {
        let amount = positive(amount)?;
        let receipt = self.db.atomic(|conn| {
            if reference_taken(conn, reference)? {
                return Err(LedgerError::DuplicateReference(reference.to_string()).into());
            }
            self.deposit_in(conn, user, amount, reference.to_string(), "deposit_confirmed")
        })?;
        info!(user = %user, amount = %amount, reference = %receipt.reference, "Deposit confirmed");
        Ok(receipt)
    }

    fn deposit_in(
        &self,
        conn: &mut SqliteConnection,
        user: &UserId,
        amount: Money,
        stem: String,
        action: &str,
    ) -> Result<Receipt> {
        let mut balance = account(conn, user)?;
        post(conn, &mut balance, TransactionKind::Deposit, SubBalance::Available, amount, &stem)?;
        write_buckets(conn, user, &balance.buckets)?;
        audit(
            conn,
            user.as_str(),
            action,
            "balance",
            user.as_str(),
            format!("deposited {} ({stem})", format_money(amount)),
        )?;
        Ok(Receipt {
            reference: stem,
            balance: balance.buckets,
        })
    }

    /// Debit `available`.
    ///
    /// # Errors
    /// Returns [`LedgerError::InsufficientFunds`] if `amount` exceeds the
    /// available bucket.
    pub fn withdraw(&self, user: &UserId, amount: Money) -> Result<Receipt> {
        let amount = positive(amount)?;
        let receipt = self.db.atomic(|conn| {
            let mut balance = account(conn, user)?;
            ensure_covers(&balance, SubBalance::Available, amount)?;
            let stem = reference::unique(conn, Prefix::Withdrawal, self.config.reference_attempts)?;
            post(conn, &mut balance, TransactionKind::Withdraw, SubBalance::Available, amount, &stem)?;
            write_buckets(conn, user, &balance.buckets)?;
            audit(
                conn,
                user.as_str(),
                "withdraw",
                "balance",
                user.as_str(),
                format!("withdrew {} ({stem})", format_money(amount)),
            )?;
            Ok(Receipt {
                reference: stem,
                balance: balance.buckets,
            })
        })?;
        info!(user = %user, amount = %amount, reference = %receipt.reference, "Withdrawal recorded");
        Ok(receipt)
    }

    /// Lock `amount` of the advertiser's available funds for `campaign`.
    ///
    /// # Errors
    /// Returns [`LedgerError::InsufficientFunds`] if `amount` exceeds the
    /// advertiser's available bucket.
    pub fn create_campaign_escrow(
        &self,
        advertiser: &UserId,
        amount: Money,
        campaign: &CampaignId,
    ) -> Result<Escrow> {
        let amount = positive(amount)?;
        let escrow = self.db.atomic(|conn| {
            get_campaign(conn, campaign)?;
            let mut balance = account(conn, advertiser)?;
            ensure_covers(&balance, SubBalance::Available, amount)?;
            let stem = reference::unique(conn, Prefix::Escrow, self.config.reference_attempts)?;
            transfer(conn, &mut balance, SubBalance::Available, SubBalance::Escrow, amount, &stem)?;

            let escrow = Escrow {
                id: EscrowId::new(),
                advertiser: advertiser.clone(),
                campaign_id: campaign.clone(),
                amount,
                remaining_amount: amount,
                status: EscrowStatus::Pending,
                assigned_creators: BTreeSet::new(),
            };
            insert_escrow(conn, &escrow)?;
            audit(
                conn,
                advertiser.as_str(),
                "create_campaign_escrow",
                "escrow",
                escrow.id.as_str(),
                format!("locked {} for campaign {campaign} ({stem})", format_money(amount)),
            )?;
            Ok(escrow)
        })?;
        info!(
            escrow_id = %escrow.id,
            campaign_id = %campaign,
            amount = %amount,
            "Campaign escrow created"
        );
        Ok(escrow)
    }

    /// Allow `creator` to draw from an escrow. Idempotent.
    ///
    /// # Errors
    /// Returns [`LedgerError::EscrowNotFound`] if the escrow does not exist.
    pub fn assign_creator(&self, escrow: &EscrowId, creator: &UserId) -> Result<Escrow> {
        self.db.atomic(|conn| {
            load_escrow(conn, escrow)?;
            assign_creator(conn, escrow, creator)?;
            load_escrow(conn, escrow)
        })
    }

    /// Return an escrow's remaining amount to the advertiser's available
    /// bucket and close it.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidStateTransition`] unless the escrow is
    /// pending.
    pub fn cancel_escrow(&self, escrow: &EscrowId) -> Result<Escrow> {
        let cancelled = self.db.atomic(|conn| {
            let mut escrow = load_escrow(conn, escrow)?;
            if escrow.status != EscrowStatus::Pending {
                return Err(LedgerError::InvalidStateTransition {
                    entity: "escrow",
                    id: escrow.id.to_string(),
                    status: escrow.status.to_string(),
                    action: "cancel",
                }
                .into());
            }

            let refund = escrow.remaining_amount;
            let mut balance = account(conn, &escrow.advertiser)?;
            if refund > Decimal::ZERO {
                let stem = reference::unique(conn, Prefix::Escrow, self.config.reference_attempts)?;
                transfer(conn, &mut balance, SubBalance::Escrow, SubBalance::Available, refund, &stem)?;
            }

            escrow.remaining_amount = Decimal::ZERO;
            escrow.status = EscrowStatus::Cancelled;
            update_escrow(conn, &escrow.id, escrow.remaining_amount, escrow.status)?;
            audit(
                conn,
                escrow.advertiser.as_str(),
                "escrow_cancelled",
                "escrow",
                escrow.id.as_str(),
                format!("refunded {}", format_money(refund)),
            )?;
            Ok(escrow)
        })?;
        info!(escrow_id = %cancelled.id, "Escrow cancelled");
        Ok(cancelled)
    }

    /// Draw `amount` from an escrow on behalf of `creator`.
    ///
    /// # Errors
    /// Returns [`LedgerError::NotAssigned`],
    /// [`LedgerError::InvalidStateTransition`] or
    /// [`LedgerError::InsufficientFunds`].
    pub fn record_earning(&self, escrow: &EscrowId, creator: &UserId, amount: Money) -> Result<Earning> {
        let earning = self
            .db
            .atomic(|conn| self.record_earning_in(conn, escrow, creator, amount, None))?;
        info!(
            escrow_id = %escrow,
            creator = %creator,
            amount = %earning.amount,
            creator_share = %earning.creator_share,
            "Earning recorded"
        );
        Ok(earning)
    }

    /// [`record_earning`](Self::record_earning) on a connection the caller
    /// already holds inside an atomic unit. `stem` overrides the generated
    /// `ERN-` reference.
    ///
    /// # Errors
    /// As [`record_earning`](Self::record_earning).
    pub(crate) fn record_earning_in(
        &self,
        conn: &mut SqliteConnection,
        escrow: &EscrowId,
        creator: &UserId,
        amount: Money,
        stem: Option<String>,
    ) -> Result<Earning> {
        let amount = positive(amount)?;
        let mut escrow = load_escrow(conn, escrow)?;
        if !escrow.assigned_creators.contains(creator) {
            return Err(LedgerError::NotAssigned {
                creator: creator.to_string(),
                escrow: escrow.id.to_string(),
            }
            .into());
        }
        if escrow.status != EscrowStatus::Pending {
            return Err(LedgerError::InvalidStateTransition {
                entity: "escrow",
                id: escrow.id.to_string(),
                status: escrow.status.to_string(),
                action: "record earning",
            }
            .into());
        }
        if amount > escrow.remaining_amount {
            return Err(LedgerError::InsufficientFunds {
                user: escrow.advertiser.to_string(),
                requested: amount,
                available: escrow.remaining_amount,
            }
            .into());
        }

        let stem = match stem {
            Some(stem) => stem,
            None => reference::unique(conn, Prefix::Earning, self.config.reference_attempts)?,
        };
        let creator_share = round_money(amount * (Decimal::ONE - self.config.platform_fee));

        // Written in order: advertiser balance, creator balance, escrow.
        let mut advertiser = account(conn, &escrow.advertiser)?;
        post(
            conn,
            &mut advertiser,
            TransactionKind::Spend,
            SubBalance::Escrow,
            amount,
            &format!("{stem}-ADV"),
        )?;
        write_buckets(conn, &advertiser.user, &advertiser.buckets)?;

        let mut earner = account_or_open(conn, creator, BalanceKind::Creator)?;
        post(
            conn,
            &mut earner,
            TransactionKind::Earning,
            SubBalance::Escrow,
            creator_share,
            &format!("{stem}-CRE"),
        )?;
        write_buckets(conn, creator, &earner.buckets)?;

        escrow.remaining_amount -= amount;
        if escrow.remaining_amount <= Decimal::ZERO {
            escrow.remaining_amount = Decimal::ZERO;
            escrow.status = EscrowStatus::Released;
        }
        update_escrow(conn, &escrow.id, escrow.remaining_amount, escrow.status)?;

        audit(
            conn,
            SYSTEM_ACTOR,
            "earning_recorded",
            "escrow",
            escrow.id.as_str(),
            format!(
                "charged {} for creator {creator}, remaining {} ({stem})",
                format_money(amount),
                format_money(escrow.remaining_amount)
            ),
        )?;
        audit(
            conn,
            SYSTEM_ACTOR,
            "escrow_funded_creator",
            "balance",
            creator.as_str(),
            format!("credited {} from escrow {}", format_money(creator_share), escrow.id),
        )?;

        if escrow.status == EscrowStatus::Released {
            info!(escrow_id = %escrow.id, "Escrow exhausted and released");
        }

        Ok(Earning {
            reference: stem,
            amount,
            creator_share,
            escrow,
        })
    }

    /// Move a creator's entire escrow bucket to available.
    ///
    /// # Errors
    /// Returns [`LedgerError::NoFundsToRelease`] if the escrow bucket is empty.
    pub fn release_earnings(&self, creator: &UserId) -> Result<Receipt> {
        let receipt = self.db.atomic(|conn| {
            let mut balance = account(conn, creator)?;
            let held = balance.buckets.escrow;
            if held <= Decimal::ZERO {
                return Err(LedgerError::NoFundsToRelease(creator.to_string()).into());
            }
            let stem = reference::unique(conn, Prefix::Release, self.config.reference_attempts)?;
            transfer(conn, &mut balance, SubBalance::Escrow, SubBalance::Available, held, &stem)?;
            audit(
                conn,
                creator.as_str(),
                "funds_released",
                "balance",
                creator.as_str(),
                format!("released {} ({stem})", format_money(held)),
            )?;
            Ok(Receipt {
                reference: stem,
                balance: balance.buckets,
            })
        })?;
        info!(creator = %creator, reference = %receipt.reference, "Earnings released");
        Ok(receipt)
    }

    /// Reserve `amount` of available funds for payout.
    ///
    /// # Errors
    /// Returns [`LedgerError::InsufficientFunds`] if `amount` exceeds the
    /// available bucket.
    pub fn request_withdrawal(&self, user: &UserId, amount: Money) -> Result<Withdrawal> {
        let amount = positive(amount)?;
        let withdrawal = self.db.atomic(|conn| {
            let mut balance = account(conn, user)?;
            ensure_covers(&balance, SubBalance::Available, amount)?;
            let stem = reference::unique(conn, Prefix::Withdrawal, self.config.reference_attempts)?;
            transfer(
                conn,
                &mut balance,
                SubBalance::Available,
                SubBalance::PendingWithdrawals,
                amount,
                &stem,
            )?;

            let withdrawal = Withdrawal {
                id: WithdrawalId::new(),
                user: user.clone(),
                amount,
                reference: stem,
                status: WithdrawalStatus::Pending,
                created_at: Utc::now(),
                approved_at: None,
                completed_at: None,
            };
            insert_withdrawal(conn, &withdrawal)?;
            audit(
                conn,
                user.as_str(),
                "withdrawal_request_created",
                "withdrawal",
                withdrawal.id.as_str(),
                format!("requested {} ({})", format_money(amount), withdrawal.reference),
            )?;
            Ok(withdrawal)
        })?;
        info!(withdrawal_id = %withdrawal.id, user = %user, amount = %amount, "Withdrawal requested");
        Ok(withdrawal)
    }

    /// Pay out a pending withdrawal from `pending_withdrawals`.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidStateTransition`] unless the withdrawal
    /// is pending.
    pub fn approve_withdrawal(&self, id: &WithdrawalId, operator: &str) -> Result<Withdrawal> {
        let withdrawal = self.db.atomic(|conn| {
            let mut withdrawal = load_withdrawal(conn, id)?;
            expect_withdrawal(&withdrawal, WithdrawalStatus::Pending, "approve")?;

            let mut balance = account(conn, &withdrawal.user)?;
            ensure_covers(&balance, SubBalance::PendingWithdrawals, withdrawal.amount)?;
            post(
                conn,
                &mut balance,
                TransactionKind::Withdraw,
                SubBalance::PendingWithdrawals,
                withdrawal.amount,
                &format!("{}-PAY", withdrawal.reference),
            )?;
            write_buckets(conn, &withdrawal.user, &balance.buckets)?;

            withdrawal.status = WithdrawalStatus::Approved;
            withdrawal.approved_at = Some(Utc::now());
            update_withdrawal(conn, id, withdrawal.status, withdrawal.approved_at, None)?;
            audit(
                conn,
                operator,
                "withdrawal_request_approved",
                "withdrawal",
                id.as_str(),
                format!("approved {}", format_money(withdrawal.amount)),
            )?;
            Ok(withdrawal)
        })?;
        info!(withdrawal_id = %id, operator, "Withdrawal approved");
        Ok(withdrawal)
    }

    /// Return a pending withdrawal's amount to available.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidStateTransition`] unless the withdrawal
    /// is pending.
    pub fn reject_withdrawal(&self, id: &WithdrawalId, operator: &str) -> Result<Withdrawal> {
        let withdrawal = self.db.atomic(|conn| {
            let mut withdrawal = load_withdrawal(conn, id)?;
            expect_withdrawal(&withdrawal, WithdrawalStatus::Pending, "reject")?;

            let mut balance = account(conn, &withdrawal.user)?;
            ensure_covers(&balance, SubBalance::PendingWithdrawals, withdrawal.amount)?;
            let stem = reference::unique(conn, Prefix::Rejection, self.config.reference_attempts)?;
            transfer(
                conn,
                &mut balance,
                SubBalance::PendingWithdrawals,
                SubBalance::Available,
                withdrawal.amount,
                &stem,
            )?;

            withdrawal.status = WithdrawalStatus::Rejected;
            update_withdrawal(conn, id, withdrawal.status, None, None)?;
            audit(
                conn,
                operator,
                "withdrawal_request_rejected",
                "withdrawal",
                id.as_str(),
                format!("returned {} ({stem})", format_money(withdrawal.amount)),
            )?;
            Ok(withdrawal)
        })?;
        warn!(withdrawal_id = %id, operator, "Withdrawal rejected");
        Ok(withdrawal)
    }

    /// Mark an approved withdrawal as paid out.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidStateTransition`] unless the withdrawal
    /// is approved.
    pub fn complete_withdrawal(&self, id: &WithdrawalId, operator: &str) -> Result<Withdrawal> {
        let withdrawal = self.db.atomic(|conn| {
            let mut withdrawal = load_withdrawal(conn, id)?;
            expect_withdrawal(&withdrawal, WithdrawalStatus::Approved, "complete")?;

            withdrawal.status = WithdrawalStatus::Completed;
            withdrawal.completed_at = Some(Utc::now());
            update_withdrawal(
                conn,
                id,
                withdrawal.status,
                withdrawal.approved_at,
                withdrawal.completed_at,
            )?;
            audit(
                conn,
                operator,
                "withdrawal_request_completed",
                "withdrawal",
                id.as_str(),
                String::new(),
            )?;
            Ok(withdrawal)
        })?;
        info!(withdrawal_id = %id, operator, "Withdrawal completed");
        Ok(withdrawal)
    }

    /// Load a withdrawal.
    ///
    /// # Errors
    /// Returns [`LedgerError::WithdrawalNotFound`] if it does not exist.
    pub fn withdrawal(&self, id: &WithdrawalId) -> Result<Withdrawal> {
        let mut conn = self.db.connection()?;
        load_withdrawal(&mut conn, id)
    }

    /// Load an escrow.
    ///
    /// # Errors
    /// Returns [`LedgerError::EscrowNotFound`] if it does not exist.
    pub fn escrow(&self, id: &EscrowId) -> Result<Escrow> {
        let mut conn = self.db.connection()?;
        load_escrow(&mut conn, id)
    }

    /// Rebuild a user's buckets from their transactions and check them
    /// against the live balance.
    ///
    /// # Errors
    /// Returns [`LedgerError::ReplayMismatch`] if any recorded
    /// `after_balance` or the final buckets disagree with the replay.
    pub fn replay(&self, user: &UserId) -> Result<Buckets> {
        let mut conn = self.db.connection()?;
        let balance = account(&mut conn, user)?;
        let entries = transactions_for(&mut conn, user)?;
        drop(conn);

        let replayed = replay(&entries).map_err(|divergence| LedgerError::ReplayMismatch {
            user: user.to_string(),
            detail: format!(
                "{} records {} but replay gives {}",
                divergence.reference, divergence.recorded, divergence.replayed
            ),
        })?;
        if replayed != balance.buckets {
            return Err(LedgerError::ReplayMismatch {
                user: user.to_string(),
                detail: format!(
                    "live buckets {:?} differ from replayed {:?}",
                    balance.buckets, replayed
                ),
            }
            .into());
        }
        Ok(replayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::ledger::audit_trail;
    use crate::error::Error;
    use crate::testkit::db::seed_campaign;
    use rust_decimal_macros::dec;

    fn service() -> (LedgerService, CampaignId, UserId) {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.connection().unwrap();
        let campaign = seed_campaign(&mut conn, "c1");
        drop(conn);
        let ledger = LedgerService::new(db, LedgerConfig::default());
        ledger
            .open_account(&campaign.advertiser, BalanceKind::Advertiser)
            .unwrap();
        (ledger, campaign.id, campaign.advertiser)
    }

    fn funded_escrow(ledger: &LedgerService, campaign: &CampaignId, advertiser: &UserId, amount: Money) -> Escrow {
        ledger.deposit(advertiser, amount).unwrap();
        ledger
            .create_campaign_escrow(advertiser, amount, campaign)
            .unwrap()
    }

    #[test]
    fn deposit_and_withdraw_touch_available() {
        let (ledger, _, adv) = service();
        let receipt = ledger.deposit(&adv, dec!(250)).unwrap();
        assert!(receipt.reference.starts_with("DEP-"));
        assert_eq!(receipt.balance.available, dec!(250));

        let receipt = ledger.withdraw(&adv, dec!(100.50)).unwrap();
        assert_eq!(receipt.balance.available, dec!(149.50));
        assert_eq!(ledger.replay(&adv).unwrap().available, dec!(149.50));
    }

    #[test]
    fn overdraw_leaves_no_trace() {
        let (ledger, _, adv) = service();
        ledger.deposit(&adv, dec!(10)).unwrap();
        let err = ledger.withdraw(&adv, dec!(10.01)).unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.transactions(&adv, 10).unwrap().len(), 1);
        assert_eq!(ledger.balance(&adv).unwrap().buckets.available, dec!(10));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let (ledger, _, adv) = service();
        assert!(matches!(
            ledger.deposit(&adv, dec!(0)).unwrap_err(),
            Error::Ledger(LedgerError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            ledger.deposit(&adv, dec!(-5)).unwrap_err(),
            Error::Ledger(LedgerError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn unknown_account_is_reported() {
        let (ledger, _, _) = service();
        let err = ledger.deposit(&UserId::from("ghost"), dec!(1)).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::AccountNotFound(_))));
    }

    #[test]
    fn confirm_deposit_rejects_reused_reference() {
        let (ledger, _, adv) = service();
        ledger.confirm_deposit(&adv, dec!(20), "PSP-001").unwrap();
        let err = ledger.confirm_deposit(&adv, dec!(20), "PSP-001").unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::DuplicateReference(_))));
        assert_eq!(ledger.balance(&adv).unwrap().buckets.available, dec!(20));
    }

    #[test]
    fn escrow_moves_funds_with_paired_entries() {
        let (ledger, campaign, adv) = service();
        ledger.deposit(&adv, dec!(1000)).unwrap();
        let escrow = ledger
            .create_campaign_escrow(&adv, dec!(600), &campaign)
            .unwrap();
        assert_eq!(escrow.remaining_amount, dec!(600));
        assert_eq!(escrow.status, EscrowStatus::Pending);

        let balance = ledger.balance(&adv).unwrap();
        assert_eq!(balance.buckets.available, dec!(400));
        assert_eq!(balance.buckets.escrow, dec!(600));

        let recent = ledger.transactions(&adv, 2).unwrap();
        assert!(recent[0].reference.ends_with("-CRE"));
        assert!(recent[1].reference.ends_with("-DEB"));
        assert_eq!(
            recent[0].reference.trim_end_matches("-CRE"),
            recent[1].reference.trim_end_matches("-DEB")
        );
    }

    #[test]
    fn escrow_beyond_available_fails() {
        let (ledger, campaign, adv) = service();
        ledger.deposit(&adv, dec!(50)).unwrap();
        let err = ledger
            .create_campaign_escrow(&adv, dec!(51), &campaign)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn earning_splits_platform_fee() {
        let (ledger, campaign, adv) = service();
        let escrow = funded_escrow(&ledger, &campaign, &adv, dec!(500));
        let creator = UserId::from("creator-1");
        ledger.assign_creator(&escrow.id, &creator).unwrap();

        let earning = ledger
            .record_earning(&escrow.id, &creator, dec!(100))
            .unwrap();
        assert_eq!(earning.creator_share, dec!(85.00));
        assert_eq!(earning.escrow.remaining_amount, dec!(400));

        assert_eq!(ledger.balance(&adv).unwrap().buckets.escrow, dec!(400));
        let creator_balance = ledger.balance(&creator).unwrap();
        assert_eq!(creator_balance.kind, BalanceKind::Creator);
        assert_eq!(creator_balance.buckets.escrow, dec!(85));

        let trail = audit_trail(&mut ledger.database().connection().unwrap(), escrow.id.as_str()).unwrap();
        assert!(trail.iter().any(|entry| entry.action == "earning_recorded"));
    }

    #[test]
    fn exhausting_escrow_releases_it() {
        let (ledger, campaign, adv) = service();
        let escrow = funded_escrow(&ledger, &campaign, &adv, dec!(40));
        let creator = UserId::from("creator-1");
        ledger.assign_creator(&escrow.id, &creator).unwrap();

        let earning = ledger.record_earning(&escrow.id, &creator, dec!(40)).unwrap();
        assert_eq!(earning.escrow.status, EscrowStatus::Released);
        assert_eq!(earning.escrow.remaining_amount, dec!(0));

        let err = ledger
            .record_earning(&escrow.id, &creator, dec!(1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn earning_checks_assignment_then_remaining() {
        let (ledger, campaign, adv) = service();
        let escrow = funded_escrow(&ledger, &campaign, &adv, dec!(30));
        let creator = UserId::from("creator-1");

        let err = ledger
            .record_earning(&escrow.id, &creator, dec!(10))
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotAssigned { .. })));

        ledger.assign_creator(&escrow.id, &creator).unwrap();
        let err = ledger
            .record_earning(&escrow.id, &creator, dec!(30.01))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.escrow(&escrow.id).unwrap().remaining_amount, dec!(30));
    }

    #[test]
    fn cancel_refunds_remaining() {
        let (ledger, campaign, adv) = service();
        let escrow = funded_escrow(&ledger, &campaign, &adv, dec!(200));
        let creator = UserId::from("creator-1");
        ledger.assign_creator(&escrow.id, &creator).unwrap();
        ledger.record_earning(&escrow.id, &creator, dec!(50)).unwrap();

        let cancelled = ledger.cancel_escrow(&escrow.id).unwrap();
        assert_eq!(cancelled.status, EscrowStatus::Cancelled);
        assert_eq!(cancelled.remaining_amount, dec!(0));

        let balance = ledger.balance(&adv).unwrap();
        assert_eq!(balance.buckets.available, dec!(150));
        assert_eq!(balance.buckets.escrow, dec!(0));

        let err = ledger.cancel_escrow(&escrow.id).unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InvalidStateTransition { action: "cancel", .. })
        ));
    }

    #[test]
    fn release_moves_escrow_to_available() {
        let (ledger, campaign, adv) = service();
        let escrow = funded_escrow(&ledger, &campaign, &adv, dec!(100));
        let creator = UserId::from("creator-1");
        ledger.assign_creator(&escrow.id, &creator).unwrap();
        ledger.record_earning(&escrow.id, &creator, dec!(20)).unwrap();

        let receipt = ledger.release_earnings(&creator).unwrap();
        assert!(receipt.reference.starts_with("REL-"));
        assert_eq!(receipt.balance.available, dec!(17));
        assert_eq!(receipt.balance.escrow, dec!(0));

        let err = ledger.release_earnings(&creator).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NoFundsToRelease(_))));
    }

    #[test]
    fn withdrawal_workflow() {
        let (ledger, _, adv) = service();
        ledger.deposit(&adv, dec!(100)).unwrap();

        let request = ledger.request_withdrawal(&adv, dec!(60)).unwrap();
        assert_eq!(request.status, WithdrawalStatus::Pending);
        let buckets = ledger.balance(&adv).unwrap().buckets;
        assert_eq!(buckets.available, dec!(40));
        assert_eq!(buckets.pending_withdrawals, dec!(60));

        let err = ledger.complete_withdrawal(&request.id, "ops").unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::InvalidStateTransition { .. })
        ));

        let approved = ledger.approve_withdrawal(&request.id, "ops").unwrap();
        assert!(approved.approved_at.is_some());
        assert_eq!(ledger.balance(&adv).unwrap().buckets.pending_withdrawals, dec!(0));

        let completed = ledger.complete_withdrawal(&request.id, "ops").unwrap();
        assert_eq!(completed.status, WithdrawalStatus::Completed);
        assert!(completed.completed_at.is_some());

        assert_eq!(ledger.replay(&adv).unwrap().total(), dec!(40));
    }

    #[test]
    fn rejected_withdrawal_returns_funds() {
        let (ledger, _, adv) = service();
        ledger.deposit(&adv, dec!(100)).unwrap();
        let request = ledger.request_withdrawal(&adv, dec!(70)).unwrap();

        let rejected = ledger.reject_withdrawal(&request.id, "ops").unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        let buckets = ledger.balance(&adv).unwrap().buckets;
        assert_eq!(buckets.available, dec!(100));
        assert_eq!(buckets.pending_withdrawals, dec!(0));

        assert!(ledger.approve_withdrawal(&request.id, "ops").is_err());
        assert!(matches!(
            ledger
                .approve_withdrawal(&WithdrawalId::from("missing"), "ops")
                .unwrap_err(),
            Error::Ledger(LedgerError::WithdrawalNotFound(_))
        ));
    }

    #[test]
    fn replay_detects_tampering() {
        let (ledger, _, adv) = service();
        ledger.deposit(&adv, dec!(10)).unwrap();
        {
            let mut conn = ledger.database().connection().unwrap();
            write_buckets(
                &mut conn,
                &adv,
                &Buckets {
                    available: dec!(11),
                    ..Buckets::default()
                },
            )
            .unwrap();
        }
        let err = ledger.replay(&adv).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::ReplayMismatch { .. })));
    }
}
