//! Default extension-point implementations
//!
//! [`FixedSearch`] runs no search: it reports a fixed search space and
//! returns fixed hyperparameters. [`PriorTrainer`] fits a
//! [`PriorClassifier`], which predicts the training class frequencies for
//! every row. Together they make the pipeline runnable end to end until a
//! real model is plugged in.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{
    Classifier, FitOptions, HyperparameterSearch, Hyperparameters, ModelError, ModelTrainer,
    Result, SearchOutcome,
};

/// Search that always returns the same hyperparameters
#[derive(Debug, Clone)]
pub struct FixedSearch {
    search_space: BTreeMap<String, String>,
    best: Hyperparameters,
}

impl Default for FixedSearch {
    fn default() -> Self {
        let search_space = (1..=3)
            .map(|i| (format!("param_{i}"), format!("param_{i}")))
            .collect();
        let best = (1..=4)
            .map(|i| (format!("param_{i}"), format!("param_{i}")))
            .collect();
        Self { search_space, best }
    }
}

impl FixedSearch {
    /// Fixed search with explicit metadata and result
    pub fn new(search_space: BTreeMap<String, String>, best: Hyperparameters) -> Self {
        Self { search_space, best }
    }
}

impl HyperparameterSearch for FixedSearch {
    fn search(&self, x: &Array2<f64>, y: &Array2<f64>, epochs: usize) -> Result<SearchOutcome> {
        tracing::debug!(
            rows = x.nrows(),
            classes = y.ncols(),
            epochs,
            "fixed search: no trials executed"
        );
        Ok(SearchOutcome {
            search_space: self.search_space.clone(),
            best: self.best.clone(),
        })
    }
}

/// Trainer producing a [`PriorClassifier`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorTrainer;

impl ModelTrainer for PriorTrainer {
    fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array2<f64>,
        hyperparameters: &Hyperparameters,
        options: &FitOptions,
    ) -> Result<Box<dyn Classifier>> {
        if x.nrows() != y.nrows() {
            return Err(ModelError::InvalidInput(format!(
                "{} feature rows but {} label rows",
                x.nrows(),
                y.nrows()
            )));
        }
        let model = PriorClassifier::fit(y, x.ncols(), hyperparameters.clone())?;
        tracing::info!(
            epochs = options.epochs,
            batch_size = options.batch_size,
            priors = ?model.class_priors,
            "fitted class-prior model"
        );
        Ok(Box::new(model))
    }
}

/// Predicts the training class distribution for every row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorClassifier {
    pub class_priors: Vec<f64>,
    pub num_features: usize,
    pub hyperparameters: Hyperparameters,
}

impl PriorClassifier {
    /// Class frequencies of one-hot (or score) labels
    pub fn fit(y: &Array2<f64>, num_features: usize, hyperparameters: Hyperparameters) -> Result<Self> {
        if y.nrows() == 0 || y.ncols() == 0 {
            return Err(ModelError::InvalidInput("empty label matrix".to_string()));
        }
        let totals: Array1<f64> = y.sum_axis(Axis(0));
        let mass = totals.sum();
        if mass <= 0.0 {
            return Err(ModelError::InvalidInput(
                "label matrix has no positive entries".to_string(),
            ));
        }
        Ok(Self {
            class_priors: totals.iter().map(|t| t / mass).collect(),
            num_features,
            hyperparameters,
        })
    }

    /// Read a model written by [`Classifier::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Classifier for PriorClassifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.num_features {
            return Err(ModelError::InvalidInput(format!(
                "expected {} features, got {}",
                self.num_features,
                x.ncols()
            )));
        }
        let priors = &self.class_priors;
        Ok(Array2::from_shape_fn((x.nrows(), priors.len()), |(_, c)| priors[c]))
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn kind(&self) -> &str {
        "class-prior"
    }
}
