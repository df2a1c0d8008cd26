//! Cleaning and preprocessing extension points
//!
//! The pipeline hands the raw frame to a [`DataCleaner`] and the cleaned
//! frame to a [`Preprocessor`]. The implementations here are deliberately
//! plain: drop incomplete rows, one-hot the target, shuffle and split.

mod cleaner;
mod split;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use ndarray::Array2;
use polars::prelude::*;
use thiserror::Error;

use crate::data::DataError;

pub use cleaner::DropNullsCleaner;
pub use split::OneHotSplitter;

/// Errors from cleaning and preprocessing
#[derive(Debug, Error)]
pub enum PrepError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("column {0} not found")]
    MissingColumn(String),

    #[error("no numeric feature columns besides the target {0}")]
    NoFeatures(String),

    #[error("test size {0} must be in (0, 1)")]
    InvalidTestSize(f64),

    #[error("{rows} row(s) cannot be split into non-empty train and test sets")]
    NotEnoughRows { rows: usize },

    #[error("target has {found} classes, expected {expected}")]
    ClassCount { expected: usize, found: usize },
}

/// Result alias for preprocessing operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Output of a [`DataCleaner`]
#[derive(Debug, Clone)]
pub struct CleanedData {
    pub frame: DataFrame,
    /// Where the cleaned frame was written
    pub path: PathBuf,
}

/// Turns the raw dataset into a cleaned one
pub trait DataCleaner {
    fn clean(&self, frame: &DataFrame) -> Result<CleanedData>;
}

/// Turns the cleaned dataset into train/test matrices
pub trait Preprocessor {
    fn preprocess(&self, frame: &DataFrame) -> Result<TrainTestSplit>;
}

/// Feature matrices and one-hot labels for training and testing
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Column names of the feature matrices
    pub feature_names: Vec<String>,
    /// Column names of the one-hot label matrices, one per class
    pub label_names: Vec<String>,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array2<f64>,
    pub y_test: Array2<f64>,
}

impl TrainTestSplit {
    pub fn n_classes(&self) -> usize {
        self.label_names.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Training features and labels side by side, as one frame
    ///
    /// Features are `float64`; label columns are `uint8` indicators.
    pub fn training_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.n_features() + self.n_classes());
        for (i, name) in self.feature_names.iter().enumerate() {
            let values: Vec<f64> = self.x_train.column(i).to_vec();
            columns.push(Series::new(name.as_str(), values));
        }
        for (i, name) in self.label_names.iter().enumerate() {
            let values: Vec<u8> = self.y_train.column(i).iter().map(|&v| u8::from(v > 0.5)).collect();
            columns.push(Series::new(name.as_str(), values));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Fail unless the label space has `expected` classes
    pub fn ensure_classes(&self, expected: usize) -> Result<()> {
        if self.n_classes() != expected {
            return Err(PrepError::ClassCount {
                expected,
                found: self.n_classes(),
            });
        }
        Ok(())
    }
}
