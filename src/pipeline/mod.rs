//! End-to-end pipeline driver
//!
//! load → ledger "Initial Features" → clean → ledger "Cleaned Features" →
//! preprocess → ledger "Training Features" → end stray runs → `main-run`
//! (ledger document and sources attached, nested [`TrainingSession`]) →
//! save the final model locally.

pub mod artifacts;
pub mod session;


use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::data::DatasetSnapshot;
use crate::eval::EvaluationMetrics;
use crate::ledger::{FeatureLedger, CLEANED_FEATURES, INITIAL_FEATURES, TRAINING_FEATURES};
use crate::model::{
    FixedSearch, HyperparameterSearch, Hyperparameters, ModelTrainer, PriorTrainer,
};
use crate::prep::{DataCleaner, DropNullsCleaner, OneHotSplitter, Preprocessor};
use crate::tracking::storage::TrackingBackend;
use crate::tracking::{ExperimentTracker, ModelVersion};
use crate::Result;

pub use artifacts::{write_model_config, ModelConfigDocument, TempArtifacts};
pub use session::{TrainingOutcome, TrainingSession};

/// Name of the top-level run
pub const MAIN_RUN_NAME: &str = "main-run";
/// Name of the nested hyperparameter search run
pub const TUNING_RUN_NAME: &str = "hyperparameter-tuning";
/// Artifact sub-path the model is uploaded under
pub const MODEL_ARTIFACT_PATH: &str = "model";

/// The pluggable stages of the pipeline
pub struct Collaborators {
    pub cleaner: Box<dyn DataCleaner>,
    pub preprocessor: Box<dyn Preprocessor>,
    pub search: Box<dyn HyperparameterSearch>,
    pub trainer: Box<dyn ModelTrainer>,
}

impl Collaborators {
    /// Drop-nulls cleaner, one-hot splitter, fixed search, class-prior model
    pub fn defaults(config: &PipelineConfig) -> Self {
        Self {
            cleaner: Box::new(DropNullsCleaner::new(&config.data.cleaned_path)),
            preprocessor: Box::new(OneHotSplitter::new(
                config.data.target.clone(),
                config.data.test_size,
                config.data.seed,
            )),
            search: Box::new(FixedSearch::default()),
            trainer: Box::new(PriorTrainer),
        }
    }
}

/// Summary of a completed pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub main_run_id: String,
    pub training_run_id: String,
    pub hyperparameters: Hyperparameters,
    pub metrics: EvaluationMetrics,
    pub model_version: ModelVersion,
    /// Where the final model was saved
    pub final_model_path: PathBuf,
    pub ledger_path: PathBuf,
}

/// Pipeline driver bound to one tracker
pub struct Pipeline<B: TrackingBackend> {
    config: PipelineConfig,
    tracker: ExperimentTracker<B>,
    ledger: FeatureLedger,
    collaborators: Collaborators,
}

impl<B: TrackingBackend> Pipeline<B> {
    /// Pipeline whose ledger lives at `config.ledger.path`
    pub fn new(config: PipelineConfig, tracker: ExperimentTracker<B>, collaborators: Collaborators) -> Self {
        let ledger = FeatureLedger::new(&config.ledger.path);
        Self {
            config,
            tracker,
            ledger,
            collaborators,
        }
    }

    /// Replace the ledger store
    #[must_use]
    pub fn with_ledger(mut self, ledger: FeatureLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &FeatureLedger {
        &self.ledger
    }

    pub fn tracker(&self) -> &ExperimentTracker<B> {
        &self.tracker
    }

    pub fn into_tracker(self) -> ExperimentTracker<B> {
        self.tracker
    }

    /// Execute the pipeline once
    pub fn run(&mut self) -> Result<PipelineReport> {
        let Self {
            config,
            tracker,
            ledger,
            collaborators,
        } = self;
        config.validate()?;

        let raw = DatasetSnapshot::from_csv(&config.data.path)?;
        ledger.record(&raw, INITIAL_FEATURES, "")?;

        let cleaned = collaborators.cleaner.clean(raw.frame())?;
        tracing::info!(path = %cleaned.path.display(), "cleaned data saved");
        let cleaned = DatasetSnapshot::new(cleaned.frame);
        ledger.record(&cleaned, CLEANED_FEATURES, "")?;

        let split = collaborators.preprocessor.preprocess(cleaned.frame())?;
        split.ensure_classes(config.training.num_classes)?;
        let training = DatasetSnapshot::new(split.training_frame()?);
        ledger.record(&training, TRAINING_FEATURES, "")?;

        let stray = tracker.end_stray_runs()?;
        if stray > 0 {
            tracing::info!(runs = stray, "ended stray active runs");
        }

        let session = TrainingSession::new(
            collaborators.search.as_ref(),
            collaborators.trainer.as_ref(),
            config.training,
            &config.artifacts,
            &config.tracking.registered_model,
        );

        let (main_run_id, outcome) =
            tracker.with_run(MAIN_RUN_NAME, false, |tracker, main| -> Result<_> {
                tracker.log_artifact(ledger.path(), None)?;
                for source in &config.artifacts.sources {
                    tracker.log_artifact(source, None)?;
                }
                let outcome = session.run(tracker, &split)?;
                Ok((main.run_id().to_string(), outcome))
            })?;

        let final_model_path = config.artifacts.final_model_path();
        outcome.model.save(&final_model_path)?;
        tracing::info!(
            path = %final_model_path.display(),
            version = %outcome.model_version.version,
            "model training completed"
        );

        Ok(PipelineReport {
            main_run_id,
            training_run_id: outcome.run_id,
            hyperparameters: outcome.hyperparameters,
            metrics: outcome.metrics,
            model_version: outcome.model_version,
            final_model_path,
            ledger_path: ledger.path().to_path_buf(),
        })
    }
}
