//! Transaction reference generation.
//!
//! Ledger references look like `DEP-0A32X19K2M`: a prefix, then four hex
//! digits of the `yymm` month and six random base-36 characters. Paired
//! entries append `-DEB`/`-CRE` (or `-ADV`/`-CRE` for earnings) to a
//! shared stem.

use chrono::{DateTime, Datelike, Utc};
use diesel::SqliteConnection;
use rand::Rng;
use tracing::warn;

use crate::adapter::outbound::sqlite::ledger::reference_taken;
use crate::error::{LedgerError, Result};

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Reference prefix per ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Deposit,
    Withdrawal,
    Escrow,
    Earning,
    Release,
    Rejection,
}

impl Prefix {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEP",
            Self::Withdrawal => "WDR",
            Self::Escrow => "ESC",
            Self::Earning => "ERN",
            Self::Release => "REL",
            Self::Rejection => "REJ",
        }
    }
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// One candidate stem for `prefix` at `now`.
#[must_use]
pub fn candidate(prefix: Prefix, now: DateTime<Utc>) -> String {
    let yymm = (now.year().rem_euclid(100) as u32) * 100 + now.month();
    format!("{}-{:04X}{}", prefix.as_str(), yymm, random_base36(6))
}

/// Candidate stem for a metering settlement of `placement` at `now`.
#[must_use]
pub fn settlement_candidate(placement: &str, now: DateTime<Utc>) -> String {
    format!(
        "ADP-{placement}-PERF-{}-{}",
        now.format("%Y%m%d%H%M"),
        &uuid::Uuid::new_v4().simple().to_string()[..6].to_uppercase()
    )
}

/// Draw candidates from `generate` until one is unused, trying at most
/// `attempts` times.
///
/// # Errors
/// Returns [`LedgerError::ReferenceExhausted`] when every attempt collides.
pub fn unique_with<F>(
    conn: &mut SqliteConnection,
    label: &str,
    attempts: u32,
    mut generate: F,
) -> Result<String>
where
    F: FnMut() -> String,
{
    for attempt in 1..=attempts {
        let stem = generate();
        if !reference_taken(conn, &stem)? {
            return Ok(stem);
        }
        warn!(stem = %stem, attempt, "Reference collision");
    }
    Err(LedgerError::ReferenceExhausted {
        prefix: label.to_string(),
        attempts,
    }
    .into())
}

/// Unused reference stem for `prefix`.
///
/// # Errors
/// Returns [`LedgerError::ReferenceExhausted`] when every attempt collides.
pub fn unique(conn: &mut SqliteConnection, prefix: Prefix, attempts: u32) -> Result<String> {
    unique_with(conn, prefix.as_str(), attempts, || candidate(prefix, Utc::now()))
}
