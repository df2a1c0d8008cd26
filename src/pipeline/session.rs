//! Run-scoped training session
//!
//! Two nested runs under the caller's active run:
//!
//! 1. `hyperparameter-tuning`: the search reports its metadata and picks
//!    the hyperparameters
//! 2. `BEST_MODEL_d{p1}_{p2}_{p3}_lr{p4}`: fit, evaluate, upload the
//!    confusion matrix, the model config and the model, register the model
//!
//! Each run is closed `FINISHED` or `FAILED` by
//! [`ExperimentTracker::with_run`]; local files go through [`TempArtifacts`].

use ndarray::Array2;

use super::artifacts::{write_model_config, TempArtifacts};
use super::{MODEL_ARTIFACT_PATH, TUNING_RUN_NAME};
use crate::config::{ArtifactsConfig, TrainingConfig};
use crate::eval::{self, EvaluationMetrics};
use crate::model::{
    Classifier, FitOptions, HyperparameterSearch, Hyperparameters, ModelTrainer, SearchOutcome,
};
use crate::prep::TrainTestSplit;
use crate::tracking::storage::TrackingBackend;
use crate::tracking::{ExperimentTracker, ModelVersion};
use crate::Result;

/// What a finished session hands back
pub struct TrainingOutcome {
    pub model: Box<dyn Classifier>,
    pub metrics: EvaluationMetrics,
    pub hyperparameters: Hyperparameters,
    pub model_version: ModelVersion,
    /// Id of the final training run
    pub run_id: String,
}

impl std::fmt::Debug for TrainingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingOutcome")
            .field("model", &self.model.kind())
            .field("metrics", &self.metrics)
            .field("hyperparameters", &self.hyperparameters)
            .field("model_version", &self.model_version)
            .field("run_id", &self.run_id)
            .finish()
    }
}

/// Tuning, training, evaluation and registration inside nested runs
pub struct TrainingSession<'a> {
    search: &'a dyn HyperparameterSearch,
    trainer: &'a dyn ModelTrainer,
    training: TrainingConfig,
    artifacts: &'a ArtifactsConfig,
    registered_model: &'a str,
}

impl<'a> TrainingSession<'a> {
    pub fn new(
        search: &'a dyn HyperparameterSearch,
        trainer: &'a dyn ModelTrainer,
        training: TrainingConfig,
        artifacts: &'a ArtifactsConfig,
        registered_model: &'a str,
    ) -> Self {
        Self {
            search,
            trainer,
            training,
            artifacts,
            registered_model,
        }
    }

    /// Tune, then train with the tuned hyperparameters
    pub fn run<B: TrackingBackend>(
        &self,
        tracker: &mut ExperimentTracker<B>,
        split: &TrainTestSplit,
    ) -> Result<TrainingOutcome> {
        let outcome = self.tune(tracker, &split.x_train, &split.y_train)?;
        self.train(tracker, split, &outcome.best)
    }

    /// Hyperparameter search inside the nested tuning run
    pub fn tune<B: TrackingBackend>(
        &self,
        tracker: &mut ExperimentTracker<B>,
        x_train: &Array2<f64>,
        y_train: &Array2<f64>,
    ) -> Result<SearchOutcome> {
        tracker.with_run(TUNING_RUN_NAME, true, |tracker, _| -> Result<SearchOutcome> {
            let outcome = self
                .search
                .search(x_train, y_train, self.training.tuning_epochs)?;
            tracker.log_params(&outcome.search_space)?;
            Ok(outcome)
        })
    }

    /// Fit, evaluate, persist and register inside the nested training run
    pub fn train<B: TrackingBackend>(
        &self,
        tracker: &mut ExperimentTracker<B>,
        split: &TrainTestSplit,
        hyperparameters: &Hyperparameters,
    ) -> Result<TrainingOutcome> {
        let run_name = hyperparameters.final_model_name()?;
        let mut temp = TempArtifacts::new();

        tracker.with_run(&run_name, true, |tracker, session| -> Result<TrainingOutcome> {
            tracker.log_params(hyperparameters.as_map())?;

            let options = FitOptions {
                epochs: self.training.final_epochs,
                batch_size: self.training.batch_size,
            };
            let model = self
                .trainer
                .fit(&split.x_train, &split.y_train, hyperparameters, &options)?;
            tracing::info!(kind = model.kind(), run = %run_name, "model trained");

            let image = temp.track(&self.artifacts.confusion_matrix);
            let evaluation = eval::evaluate(
                model.as_ref(),
                &split.x_test,
                &split.y_test,
                self.training.num_classes,
                &image,
            )?;
            tracker.log_metrics(evaluation.metrics.as_map())?;
            tracker.log_artifact(&image, None)?;

            let config_path = temp.track(self.artifacts.model_config_path());
            write_model_config(&config_path, hyperparameters, &evaluation.metrics)?;
            tracker.log_artifact(&config_path, None)?;

            let model_path = temp.track(&self.artifacts.temp_model);
            model.save(&model_path)?;
            tracker.log_artifact(&model_path, Some(MODEL_ARTIFACT_PATH))?;

            let model_version = tracker.register_model(
                &session.artifact_uri(MODEL_ARTIFACT_PATH),
                self.registered_model,
            )?;

            temp.cleanup();

            Ok(TrainingOutcome {
                model,
                metrics: evaluation.metrics,
                hyperparameters: hyperparameters.clone(),
                model_version,
                run_id: session.run_id().to_string(),
            })
        })
    }
}
