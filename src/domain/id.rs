//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a UUID-backed identifier newtype.
///
/// The inner String is private so construction goes through `new` (fresh
/// UUID v4) or the `From` conversions used when loading persisted rows.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier with a generated UUID.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

uuid_id!(
    /// Marketplace user (advertiser, creator, or operator).
    UserId
);
uuid_id!(
    /// Advertiser campaign.
    CampaignId
);
uuid_id!(
    /// Creative belonging to a campaign.
    AdId
);
uuid_id!(
    /// Third-party content channel.
    ChannelId
);
uuid_id!(
    /// Placement of one ad on one channel.
    PlacementId
);
uuid_id!(
    /// Campaign escrow funding event.
    EscrowId
);
uuid_id!(
    /// Creator withdrawal request.
    WithdrawalId
);
uuid_id!(
    /// Per-cycle performance record.
    RecordId
);
