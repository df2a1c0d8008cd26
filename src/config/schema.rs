//! YAML schema for the pipeline configuration
//!
//! Every field has a default, so an empty file (or no file) yields the
//! stock setup: a local MLflow server on port 6969, `./data/train.csv`,
//! `features.yaml` in the working directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracking: TrackingConfig,
    pub data: DataConfig,
    pub ledger: LedgerConfig,
    pub artifacts: ArtifactsConfig,
    pub training: TrainingConfig,
}

/// Which tracking backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// MLflow REST server at `tracking.uri`
    #[default]
    Mlflow,
    /// JSON files under `tracking.local_dir`
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub uri: String,
    pub experiment: String,
    pub backend: BackendKind,
    pub local_dir: PathBuf,
    /// Name the trained model is registered under
    pub registered_model: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:6969".to_string(),
            experiment: "credit_score_classification_testing".to_string(),
            backend: BackendKind::Mlflow,
            local_dir: PathBuf::from("mlruns"),
            registered_model: "credit_score_classifier".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Raw training CSV
    pub path: PathBuf,
    /// Where the cleaner writes its output
    pub cleaned_path: PathBuf,
    /// Label column
    pub target: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/train.csv"),
            cleaned_path: PathBuf::from("./data/cleaned.csv"),
            target: "Credit_Score".to_string(),
            test_size: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::ledger::DEFAULT_LEDGER_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory for the model config document and the final model
    pub model_dir: PathBuf,
    pub confusion_matrix: PathBuf,
    /// Model file uploaded to the tracking server, then deleted
    pub temp_model: PathBuf,
    /// File name of the model kept in `model_dir`
    pub final_model: String,
    /// Extra files attached to the main run
    pub sources: Vec<PathBuf>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("model_artifacts"),
            confusion_matrix: PathBuf::from("confusion_matrix.png"),
            temp_model: PathBuf::from("temp_model.json"),
            final_model: "credit_score_model_tuned.json".to_string(),
            sources: Vec::new(),
        }
    }
}

impl ArtifactsConfig {
    pub fn model_config_path(&self) -> PathBuf {
        self.model_dir.join("model_config.yaml")
    }

    pub fn final_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.final_model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Epochs per trial during hyperparameter search
    pub tuning_epochs: usize,
    /// Epochs for the final fit
    pub final_epochs: usize,
    pub batch_size: usize,
    /// Size of the label space
    pub num_classes: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            tuning_epochs: 10,
            final_epochs: 50,
            batch_size: 32,
            num_classes: 3,
        }
    }
}
