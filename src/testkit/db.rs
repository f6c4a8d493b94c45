//! In-memory database fixture and seeding helpers.
//!
//! Seeds go through the production store functions, so a seeded row is
//! exactly what request handlers would have written.

use diesel::SqliteConnection;

use super::domain;
use crate::adapter::outbound::sqlite::campaign::{insert_ad, insert_campaign};
use crate::adapter::outbound::sqlite::channel::insert_channel;
use crate::adapter::outbound::sqlite::placement::insert_placement;
use crate::adapter::outbound::sqlite::Database;
use crate::domain::campaign::{Ad, Campaign};
use crate::domain::channel::Channel;
use crate::domain::placement::Placement;

/// Fresh migrated in-memory database.
///
/// # Panics
/// Panics if the database cannot be opened.
pub fn memory_db() -> Database {
    Database::open_in_memory().expect("in-memory database")
}

/// Insert [`domain::campaign`].
///
/// # Panics
/// Panics if the insert fails.
pub fn seed_campaign(conn: &mut SqliteConnection, id: &str) -> Campaign {
    let campaign = domain::campaign(id);
    save_campaign(conn, campaign)
}

/// Insert a customised campaign.
///
/// # Panics
/// Panics if the insert fails.
pub fn save_campaign(conn: &mut SqliteConnection, campaign: Campaign) -> Campaign {
    insert_campaign(conn, &campaign).expect("insert campaign");
    campaign
}

/// Insert [`domain::ad`].
///
/// # Panics
/// Panics if the insert fails.
pub fn seed_ad(conn: &mut SqliteConnection, id: &str, campaign: &str) -> Ad {
    let ad = domain::ad(id, campaign);
    insert_ad(conn, &ad).expect("insert ad");
    ad
}

/// Insert [`domain::channel`].
///
/// # Panics
/// Panics if the insert fails.
pub fn seed_channel(conn: &mut SqliteConnection, id: &str, owner: &str) -> Channel {
    save_channel(conn, domain::channel(id, owner))
}

/// Insert a customised channel, with its reputation if any.
///
/// # Panics
/// Panics if the insert fails.
pub fn save_channel(conn: &mut SqliteConnection, channel: Channel) -> Channel {
    insert_channel(conn, &channel).expect("insert channel");
    channel
}

/// Insert a placement.
///
/// # Panics
/// Panics if the insert fails.
pub fn seed_placement(conn: &mut SqliteConnection, placement: Placement) -> Placement {
    insert_placement(conn, &placement).expect("insert placement");
    placement
}
