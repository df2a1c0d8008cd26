//! Top-level error type
//!
//! Each module owns a `thiserror` enum; [`PipelineError`] folds them together
//! for the driver and the CLI.

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::DataError;
use crate::eval::EvalError;
use crate::ledger::LedgerError;
use crate::model::ModelError;
use crate::prep::PrepError;
use crate::tracking::TrackingError;

/// Errors surfaced by the pipeline driver
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("feature ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("preprocessing error: {0}")]
    Prep(#[from] PrepError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
