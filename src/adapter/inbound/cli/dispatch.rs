//! Routes parsed subcommands to their handlers.

use crate::adapter::inbound::cli::command::Commands;
use crate::adapter::inbound::cli::{config, ledger, migrate, rank, reconcile};
use crate::error::Result;
use crate::port::inbound::operator::port::OperatorPort;

/// Run one subcommand against `operator`.
///
/// # Errors
/// Returns the handler's error; the binary reports it and exits non-zero.
pub fn execute(command: Commands, operator: &dyn OperatorPort) -> Result<()> {
    match command {
        Commands::Migrate(args) => migrate::execute(operator, &args.config),
        Commands::Rank(args) => rank::execute(operator, &args.config, &args.campaign, args.top_n),
        Commands::Balance(args) => {
            ledger::execute_balance(operator, &args.config, &args.user, args.limit)
        }
        Commands::Audit(args) => ledger::execute_audit(operator, &args.config, &args.user),
        Commands::Reconcile(args) => reconcile::execute(operator, &args.config),
        Commands::CheckConfig(args) => config::execute_check(operator, &args.config),
    }
}
