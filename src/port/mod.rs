//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The engine reaches the outside world through three ports:
//!
//! - [`Delivery`] posts and deletes ad content on a channel
//! - [`MetricsSource`] reports cumulative delivery counters per placement
//! - [`Notifier`] receives operator and owner events (fire-and-forget)
//!
//! Persistence is not a port: the SQLite adapter is the only store and
//! services take a [`Database`](crate::adapter::outbound::sqlite::Database)
//! directly.
//!
//! Operator use-cases for the CLI live under [`inbound::operator`].

pub mod inbound;
pub mod outbound;

pub use outbound::delivery::{DeleteRequest, Delivery, PostRequest};
pub use outbound::metrics::MetricsSource;
pub use outbound::notifier::{
    DeliveryAction, Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier,
};
