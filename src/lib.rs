//! credit-pipeline - experiment-tracked credit-score classification training
//!
//! Wraps a credit-score classification training pipeline with feature
//! bookkeeping and experiment tracking:
//!
//! - [`ledger`] - sidecar document recording the columns and types of each
//!   named dataset snapshot
//! - [`data`] - CSV loading and dataset snapshots
//! - [`prep`] - cleaning and preprocessing extension points with default
//!   implementations
//! - [`model`] - hyperparameter search, model fit, and classifier extension points
//! - [`eval`] - confusion matrix, classification report, heatmap rendering
//! - [`tracking`] - run lifecycle on an experiment-tracking server (MLflow,
//!   local JSON files, in-memory)
//! - [`pipeline`] - the run-scoped training session and the end-to-end driver
//! - [`config`] - YAML configuration and command-line definitions
//! - [`cli`] - command handlers for the `credit-pipeline` binary
//!
//! # Example
//!
//! ```no_run
//! use credit_pipeline::config::PipelineConfig;
//! use credit_pipeline::pipeline::{Collaborators, Pipeline};
//! use credit_pipeline::tracking::{storage::JsonFileBackend, ExperimentTracker};
//!
//! # fn main() -> credit_pipeline::Result<()> {
//! let config = PipelineConfig::default();
//! let backend = JsonFileBackend::new("mlruns");
//! let tracker = ExperimentTracker::new(&config.tracking.experiment, backend)?;
//! let collaborators = Collaborators::defaults(&config);
//!
//! let report = Pipeline::new(config, tracker, collaborators).run()?;
//! println!("accuracy: {:.4}", report.metrics.accuracy());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod ledger;
pub mod model;
pub mod pipeline;
pub mod prep;
pub mod tracking;

pub use error::{PipelineError, Result};
