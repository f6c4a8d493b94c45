//! Marketplace domain types.
//!
//! Pure data and rules: no storage, no delivery, no clock reads except
//! where a timestamp is carried as data.

pub mod campaign;
pub mod channel;
pub mod error;
pub mod id;
pub mod ledger;
pub mod match_log;
pub mod money;
pub mod objective;
pub mod performance;
pub mod placement;

pub use campaign::{Ad, Campaign, CampaignStatus, Objective, Schedule, Targeting};
pub use channel::{Channel, ChannelStatus, Reputation};
pub use id::{AdId, CampaignId, ChannelId, EscrowId, PlacementId, RecordId, UserId, WithdrawalId};
pub use ledger::{
    Balance, BalanceKind, Buckets, Escrow, EscrowStatus, SubBalance, Transaction,
    TransactionKind, Withdrawal, WithdrawalStatus,
};
pub use match_log::{MatchLog, MatchStage};
pub use money::{format_money, round_money, Money};
pub use objective::WeightProfile;
pub use performance::{DeliveryCounters, PerformanceDelta, PerformanceRecord};
pub use placement::{FollowUp, Placement, PlacementStatus, TransitionOrigin};
