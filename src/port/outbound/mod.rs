//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the content-delivery platform, the delivery
//! metrics feed, and notifications.

pub mod delivery;
pub mod metrics;
pub mod notifier;
