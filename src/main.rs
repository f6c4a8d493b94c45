use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use adzengine::adapter::inbound::cli::command::Cli;
use adzengine::adapter::inbound::cli::dispatch::execute;
use adzengine::adapter::inbound::cli::output::{self, OutputConfig};
use adzengine::infrastructure::operator::entry::Operator;

fn run(cli: Cli) -> anyhow::Result<()> {
    let name = cli.command.name();
    execute(cli.command, &Operator).with_context(|| format!("{name} failed"))
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
