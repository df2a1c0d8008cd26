//! credit-pipeline CLI
//!
//! # Usage
//!
//! ```bash
//! # Full pipeline against the default MLflow server
//! credit-pipeline run
//!
//! # Offline, tracking to JSON files
//! credit-pipeline run --local-tracking ./mlruns
//!
//! # Feature ledger
//! credit-pipeline ledger show --format yaml
//! credit-pipeline ledger purge
//! ```

use clap::Parser;
use credit_pipeline::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
