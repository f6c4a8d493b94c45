//! Notifier port for event notifications.
//!
//! This module defines the trait for sending notifications about engine
//! events: delivery failures, evictions, abandoned settlements, and
//! placement status changes that channel owners should hear about.

use rust_decimal::Decimal;

use crate::domain::id::{CampaignId, PlacementId};
use crate::domain::placement::PlacementStatus;

/// Delivery call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryAction {
    Post,
    Delete,
    Repost,
}

impl DeliveryAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Repost => "repost",
        }
    }
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A placement changed status; addressed to the channel owner.
    PlacementStatusChanged {
        placement: PlacementId,
        status: PlacementStatus,
    },
    /// A delivery call failed; addressed to operators.
    DeliveryFailed {
        placement: PlacementId,
        action: DeliveryAction,
        reason: String,
    },
    /// A placement was evicted to keep the campaign within budget.
    PlacementEvicted {
        campaign: CampaignId,
        placement: PlacementId,
        cost: Decimal,
    },
    /// A placement's settlement was abandoned for this cycle.
    SettlementAbandoned {
        campaign: CampaignId,
        placement: PlacementId,
        reason: String,
    },
    /// Metering stopped a campaign because no placement fit its budget.
    CampaignStopped { campaign: CampaignId },
}

/// Trait for notification handlers.
///
/// Implement this trait to receive events from the engine.
/// Notifications are fire-and-forget.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - The `notify` method should not block or perform slow I/O synchronously
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }
}

/// A no-op notifier for when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{info, warn};
        match event {
            Event::PlacementStatusChanged { placement, status } => {
                info!(placement_id = %placement, status = %status, "Placement status changed");
            }
            Event::DeliveryFailed {
                placement,
                action,
                reason,
            } => {
                warn!(
                    placement_id = %placement,
                    action = action.as_str(),
                    reason = %reason,
                    "Delivery failed"
                );
            }
            Event::PlacementEvicted {
                campaign,
                placement,
                cost,
            } => {
                info!(
                    campaign_id = %campaign,
                    placement_id = %placement,
                    cost = %cost,
                    "Placement evicted"
                );
            }
            Event::SettlementAbandoned {
                campaign,
                placement,
                reason,
            } => {
                warn!(
                    campaign_id = %campaign,
                    placement_id = %placement,
                    reason = %reason,
                    "Settlement abandoned"
                );
            }
            Event::CampaignStopped { campaign } => {
                info!(campaign_id = %campaign, "Campaign stopped by metering");
            }
        }
    }
}
