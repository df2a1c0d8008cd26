//! Model extension points
//!
//! The pipeline does not prescribe a model architecture or a search
//! strategy. It talks to three traits:
//!
//! - [`HyperparameterSearch`] picks the hyperparameters for the final fit
//! - [`ModelTrainer`] fits a model with those hyperparameters
//! - [`Classifier`] is the fitted model: class scores out, bytes to disk
//!
//! [`baseline`] provides the implementations wired in by default: a fixed
//! search space and a class-prior classifier.

pub mod baseline;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use baseline::{FixedSearch, PriorClassifier, PriorTrainer};

/// Errors from model fitting, prediction and persistence
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing hyperparameter: {0}")]
    MissingHyperparameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Flat, ordered hyperparameter mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hyperparameters(BTreeMap<String, String>);

impl Hyperparameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for a key that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| ModelError::MissingHyperparameter(key.to_string()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run name for the final training run:
    /// `BEST_MODEL_d{param_1}_{param_2}_{param_3}_lr{param_4}`
    pub fn final_model_name(&self) -> Result<String> {
        Ok(format!(
            "BEST_MODEL_d{}_{}_{}_lr{}",
            self.require("param_1")?,
            self.require("param_2")?,
            self.require("param_3")?,
            self.require("param_4")?,
        ))
    }
}

impl FromIterator<(String, String)> for Hyperparameters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of a hyperparameter search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Search metadata logged on the tuning run
    pub search_space: BTreeMap<String, String>,
    /// Hyperparameters chosen for the final fit
    pub best: Hyperparameters,
}

/// Fit-time settings that are not hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
}

/// Chooses hyperparameters for the final fit
pub trait HyperparameterSearch {
    /// Search over the training data for at most `epochs` epochs per trial
    fn search(&self, x: &Array2<f64>, y: &Array2<f64>, epochs: usize) -> Result<SearchOutcome>;
}

/// Fits a classifier
pub trait ModelTrainer {
    /// Fit on features `x` and one-hot labels `y`
    fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        hyperparameters: &Hyperparameters,
        options: &FitOptions,
    ) -> Result<Box<dyn Classifier>>;
}

/// A fitted classification model
pub trait Classifier {
    /// Per-class scores, one row per input row
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Serialize the model to `path`
    fn save(&self, path: &Path) -> Result<()>;

    /// Short model kind, used in log lines
    fn kind(&self) -> &str;
}
