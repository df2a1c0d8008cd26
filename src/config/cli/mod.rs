//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! credit-pipeline run
//! credit-pipeline run --config pipeline.yaml --local-tracking ./mlruns
//! credit-pipeline ledger record data/train.csv --name "Initial Features"
//! credit-pipeline ledger show --format json
//! credit-pipeline ledger purge
//! credit-pipeline evaluate --labels y_test.csv --predictions y_pred.csv
//! ```

mod args;
mod types;

pub use args::{
    apply_overrides, parse_args, Cli, Command, EvaluateArgs, LedgerArgs, LedgerCommand,
    LedgerPurgeArgs, LedgerRecordArgs, LedgerShowArgs, RunArgs,
};
pub use types::OutputFormat;
