//! Shared helper routines for operator implementations.

use std::path::Path;

use crate::adapter::outbound::sqlite::Database;
use crate::error::Result;
use crate::infrastructure::bootstrap::open_database;
use crate::infrastructure::config::settings::Config;

/// Load configuration, start logging and open the database.
pub(super) fn open(path: &Path) -> Result<(Config, Database)> {
    let config = Config::load(path)?;
    config.init_logging();
    let db = open_database(&config)?;
    Ok((config, db))
}
