//! Command-line interface definitions.
//!
//! Defines the operator CLI for the adzengine database using `clap`:
//! migrating, ranking channels for a campaign, inspecting and auditing
//! ledger balances, reconciling unsettled metering records, and validating
//! configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator tooling for the allocation and metered-billing engine
#[derive(Parser, Debug)]
#[command(name = "adzengine")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the adzengine CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the database schema
    Migrate(ConfigPathArg),

    /// Rank eligible channels for a campaign
    Rank(RankArgs),

    /// Show a user's balance and recent transactions
    Balance(UserArgs),

    /// Replay a user's transactions against the live balance
    Audit(UserArgs),

    /// List metering records whose settlement never completed
    Reconcile(ConfigPathArg),

    /// Validate a configuration file
    CheckConfig(ConfigPathArg),
}

impl Commands {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Migrate(_) => "migrate",
            Self::Rank(_) => "rank",
            Self::Balance(_) => "balance",
            Self::Audit(_) => "audit",
            Self::Reconcile(_) => "reconcile",
            Self::CheckConfig(_) => "check-config",
        }
    }
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `rank` subcommand.
#[derive(Parser, Debug)]
pub struct RankArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Campaign identifier
    #[arg(long)]
    pub campaign: String,

    /// Override the configured shortlist size
    #[arg(long)]
    pub top_n: Option<usize>,
}

/// Arguments for commands addressed to one ledger account.
#[derive(Parser, Debug)]
pub struct UserArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// User identifier
    #[arg(long)]
    pub user: String,

    /// Number of recent transactions to list
    #[arg(long, default_value = "20")]
    pub limit: usize,
}
