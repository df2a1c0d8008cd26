//! Argument structs: Cli, Command and per-command arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;
use crate::config::{BackendKind, PipelineConfig};

/// credit-pipeline: experiment-tracked credit-score classification
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "credit-pipeline")]
#[command(version)]
#[command(
    about = "Experiment-tracked training pipeline for credit-score classification"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the full pipeline: ledger, clean, preprocess, train, evaluate, register
    Run(RunArgs),

    /// Inspect or edit the feature ledger
    Ledger(LedgerArgs),

    /// Evaluate one-hot label and prediction score CSVs offline
    Evaluate(EvaluateArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct RunArgs {
    /// Path to YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the training CSV
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Override the tracking server URI
    #[arg(long, value_name = "URI")]
    pub tracking_uri: Option<String>,

    /// Override the experiment name
    #[arg(long)]
    pub experiment: Option<String>,

    /// Track to JSON files in DIR instead of a tracking server
    #[arg(long, value_name = "DIR")]
    pub local_tracking: Option<PathBuf>,
}

/// Arguments for the ledger command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommand,
}

/// Ledger subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    /// Record the schema of a CSV file under a snapshot name
    Record(LedgerRecordArgs),

    /// Print the ledger document
    Show(LedgerShowArgs),

    /// Delete the ledger document
    Purge(LedgerPurgeArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LedgerRecordArgs {
    /// CSV file to describe
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Snapshot name (ledger key)
    #[arg(short, long)]
    pub name: String,

    /// Free-text description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Ledger document path
    #[arg(long, default_value = crate::ledger::DEFAULT_LEDGER_FILE)]
    pub ledger: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LedgerShowArgs {
    /// Ledger document path
    #[arg(long, default_value = crate::ledger::DEFAULT_LEDGER_FILE)]
    pub ledger: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LedgerPurgeArgs {
    /// Ledger document path
    #[arg(long, default_value = crate::ledger::DEFAULT_LEDGER_FILE)]
    pub ledger: PathBuf,
}

/// Arguments for the evaluate command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct EvaluateArgs {
    /// One-hot ground-truth CSV, one column per class
    #[arg(long, value_name = "CSV")]
    pub labels: PathBuf,

    /// Prediction score CSV, one column per class
    #[arg(long, value_name = "CSV")]
    pub predictions: PathBuf,

    /// Where to write the confusion-matrix image
    #[arg(short, long, default_value = "confusion_matrix.png")]
    pub output: PathBuf,

    /// Size of the label space
    #[arg(long, default_value_t = 3)]
    pub num_classes: usize,

    /// Output format for the metrics (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a pipeline configuration
///
/// The `--config` file itself is appended to `artifacts.sources`.
pub fn apply_overrides(config: &mut PipelineConfig, args: &RunArgs) {
    if let Some(data) = &args.data {
        config.data.path = data.clone();
    }
    if let Some(uri) = &args.tracking_uri {
        config.tracking.uri = uri.clone();
        config.tracking.backend = BackendKind::Mlflow;
    }
    if let Some(experiment) = &args.experiment {
        config.tracking.experiment = experiment.clone();
    }
    if let Some(dir) = &args.local_tracking {
        config.tracking.local_dir = dir.clone();
        config.tracking.backend = BackendKind::Local;
    }
    // The config file travels with the main run
    if let Some(path) = &args.config {
        if !config.artifacts.sources.contains(path) {
            config.artifacts.sources.push(path.clone());
        }
    }
}
