//! Ledger entities: balances, transactions, escrows and withdrawals.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{CampaignId, EscrowId, UserId, WithdrawalId};
use super::money::Money;

/// Declares a string-backed status enum with `as_str`, `Display` and
/// `FromStr`.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Stable name used in storage and logs.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(DomainError::UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Role a balance belongs to.
    BalanceKind, "balance kind" {
        Advertiser => "advertiser",
        Creator => "creator",
    }
);

string_enum!(
    /// Bucket of a balance that a transaction affects.
    SubBalance, "sub-balance" {
        Available => "available",
        Escrow => "escrow",
        PendingWithdrawals => "pending_withdrawals",
    }
);

string_enum!(
    /// Ledger entry type. Determines the sign applied to the bucket.
    TransactionKind, "transaction kind" {
        Deposit => "deposit",
        Withdraw => "withdraw",
        Credit => "credit",
        Debit => "debit",
        Spend => "spend",
        Earning => "earning",
    }
);

string_enum!(
    /// Escrow lifecycle.
    EscrowStatus, "escrow" {
        Pending => "pending",
        Released => "released",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Withdrawal request lifecycle.
    WithdrawalStatus, "withdrawal" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Completed => "completed",
    }
);

impl TransactionKind {
    /// Signed change applied to the bucket for an entry of `amount`.
    #[must_use]
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Deposit | Self::Credit | Self::Earning => amount,
            Self::Withdraw | Self::Debit | Self::Spend => -amount,
        }
    }
}

/// The three buckets of a balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buckets {
    pub available: Money,
    pub escrow: Money,
    pub pending_withdrawals: Money,
}

impl Buckets {
    #[must_use]
    pub fn get(&self, bucket: SubBalance) -> Money {
        match bucket {
            SubBalance::Available => self.available,
            SubBalance::Escrow => self.escrow,
            SubBalance::PendingWithdrawals => self.pending_withdrawals,
        }
    }

    /// Apply a signed change to one bucket, returning its new value.
    pub fn apply(&mut self, bucket: SubBalance, change: Money) -> Money {
        let slot = match bucket {
            SubBalance::Available => &mut self.available,
            SubBalance::Escrow => &mut self.escrow,
            SubBalance::PendingWithdrawals => &mut self.pending_withdrawals,
        };
        *slot += change;
        *slot
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.available + self.escrow + self.pending_withdrawals
    }
}

/// Per-user balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub user: UserId,
    pub kind: BalanceKind,
    pub buckets: Buckets,
}

impl Balance {
    #[must_use]
    pub fn total(&self) -> Money {
        self.buckets.total()
    }
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Insertion order.
    pub id: i64,
    pub user: UserId,
    pub kind: TransactionKind,
    pub amount: Money,
    pub sub_balance: SubBalance,
    /// Value of `sub_balance` after this entry.
    pub after_balance: Money,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// First transaction whose recorded `after_balance` disagrees with the
/// value obtained by replaying the entries before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayDivergence {
    pub reference: String,
    pub recorded: Money,
    pub replayed: Money,
}

/// Rebuild balance buckets from transactions in insertion order.
///
/// # Errors
/// Returns the first entry whose `after_balance` does not match.
pub fn replay(transactions: &[Transaction]) -> Result<Buckets, ReplayDivergence> {
    let mut buckets = Buckets::default();
    for tx in transactions {
        let replayed = buckets.apply(tx.sub_balance, tx.kind.signed(tx.amount));
        if replayed != tx.after_balance {
            return Err(ReplayDivergence {
                reference: tx.reference.clone(),
                recorded: tx.after_balance,
                replayed,
            });
        }
    }
    Ok(buckets)
}

/// Funds locked from an advertiser for one campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escrow {
    pub id: EscrowId,
    pub advertiser: UserId,
    pub campaign_id: CampaignId,
    pub amount: Money,
    /// Never increases except on cancellation; never negative.
    pub remaining_amount: Money,
    pub status: EscrowStatus,
    /// Channel owners allowed to draw from this escrow.
    pub assigned_creators: BTreeSet<UserId>,
}

impl Escrow {
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining_amount <= Decimal::ZERO
    }
}

/// Creator payout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub user: UserId,
    pub amount: Money,
    pub reference: String,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(
        id: i64,
        kind: TransactionKind,
        amount: Money,
        sub_balance: SubBalance,
        after: Money,
    ) -> Transaction {
        Transaction {
            id,
            user: UserId::from("u"),
            kind,
            amount,
            sub_balance,
            after_balance: after,
            reference: format!("REF-{id}"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn signs_follow_kind() {
        assert_eq!(TransactionKind::Deposit.signed(dec!(5)), dec!(5));
        assert_eq!(TransactionKind::Earning.signed(dec!(5)), dec!(5));
        assert_eq!(TransactionKind::Spend.signed(dec!(5)), dec!(-5));
        assert_eq!(TransactionKind::Withdraw.signed(dec!(5)), dec!(-5));
    }

    #[test]
    fn replay_rebuilds_buckets() {
        let log = vec![
            tx(1, TransactionKind::Deposit, dec!(500), SubBalance::Available, dec!(500)),
            tx(2, TransactionKind::Debit, dec!(200), SubBalance::Available, dec!(300)),
            tx(3, TransactionKind::Credit, dec!(200), SubBalance::Escrow, dec!(200)),
            tx(4, TransactionKind::Spend, dec!(50), SubBalance::Escrow, dec!(150)),
        ];
        let buckets = replay(&log).unwrap();
        assert_eq!(buckets.available, dec!(300));
        assert_eq!(buckets.escrow, dec!(150));
        assert_eq!(buckets.total(), dec!(450));
    }

    #[test]
    fn replay_reports_first_divergence() {
        let log = vec![
            tx(1, TransactionKind::Deposit, dec!(100), SubBalance::Available, dec!(100)),
            tx(2, TransactionKind::Withdraw, dec!(30), SubBalance::Available, dec!(80)),
        ];
        let divergence = replay(&log).unwrap_err();
        assert_eq!(divergence.reference, "REF-2");
        assert_eq!(divergence.replayed, dec!(70));
        assert_eq!(divergence.recorded, dec!(80));
    }

    #[test]
    fn statuses_parse() {
        assert_eq!("released".parse::<EscrowStatus>().unwrap(), EscrowStatus::Released);
        assert_eq!(
            "pending_withdrawals".parse::<SubBalance>().unwrap(),
            SubBalance::PendingWithdrawals
        );
        assert!("frozen".parse::<WithdrawalStatus>().is_err());
    }
}
