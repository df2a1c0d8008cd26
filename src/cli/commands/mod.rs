//! CLI command implementations

mod evaluate;
mod ledger;
mod run;

#[cfg(test)]
mod tests;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run(args) => run::run_pipeline(args, log_level),
        Command::Ledger(args) => ledger::run_ledger(args, log_level),
        Command::Evaluate(args) => evaluate::run_evaluate(args, log_level),
    }
}
