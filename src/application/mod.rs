//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the engine's use cases: ranking channels, allocating
//! placements, metering delivery, and keeping the ledger.

pub mod allocator;
pub mod ledger;
pub mod lock;
pub mod matcher;
pub mod metering;
pub mod reference;

pub use allocator::{ActivationOutcome, ActivationReport, PlacementAllocator, RepostOutcome};
pub use ledger::LedgerService;
pub use lock::CampaignLocks;
pub use matcher::{ChannelMatcher, RankedChannel};
pub use metering::{CycleReport, MeteringEngine};
