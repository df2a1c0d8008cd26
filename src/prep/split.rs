use std::collections::BTreeSet;

use ndarray::{Array2, Axis};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{PrepError, Preprocessor, Result, TrainTestSplit};
use crate::data::{column_as_f64, DataError};

/// One-hot encodes a target column and makes a seeded shuffled split
///
/// Numeric columns other than the target become features; other columns
/// are skipped. Classes are the sorted distinct target values, so class
/// index `i` always names the same label for a given dataset. The test set
/// gets `ceil(rows * test_size)` rows.
#[derive(Debug, Clone)]
pub struct OneHotSplitter {
    target: String,
    test_size: f64,
    seed: u64,
}

impl OneHotSplitter {
    pub fn new(target: impl Into<String>, test_size: f64, seed: u64) -> Self {
        Self {
            target: target.into(),
            test_size,
            seed,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn target_labels(&self, frame: &DataFrame) -> Result<Vec<String>> {
        let column = frame
            .column(&self.target)
            .map_err(|_| PrepError::MissingColumn(self.target.clone()))?
            .cast(&DataType::String)?;
        let nulls = column.null_count();
        if nulls > 0 {
            return Err(DataError::NullValues {
                column: self.target.clone(),
                nulls,
            }
            .into());
        }
        Ok(column
            .str()?
            .into_no_null_iter()
            .map(str::to_string)
            .collect())
    }

    fn feature_columns(&self, frame: &DataFrame) -> Vec<String> {
        frame
            .get_columns()
            .iter()
            .filter(|series| series.name() != self.target)
            .filter(|series| {
                let numeric = series.dtype().is_numeric();
                if !numeric {
                    tracing::debug!(column = series.name(), dtype = %series.dtype(), "skipping non-numeric column");
                }
                numeric
            })
            .map(|series| series.name().to_string())
            .collect()
    }

    fn shuffled_indices(&self, rows: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);
        indices
    }
}

impl Preprocessor for OneHotSplitter {
    fn preprocess(&self, frame: &DataFrame) -> Result<TrainTestSplit> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PrepError::InvalidTestSize(self.test_size));
        }

        let labels = self.target_labels(frame)?;
        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let feature_names = self.feature_columns(frame);
        if feature_names.is_empty() {
            return Err(PrepError::NoFeatures(self.target.clone()));
        }

        let rows = frame.height();
        let n_test = (rows as f64 * self.test_size).ceil() as usize;
        if rows < 2 || n_test == 0 || n_test >= rows {
            return Err(PrepError::NotEnoughRows { rows });
        }

        let columns = feature_names
            .iter()
            .map(|name| column_as_f64(frame, name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let x = Array2::from_shape_fn((rows, columns.len()), |(r, c)| columns[c][r]);

        let y = Array2::from_shape_fn((rows, classes.len()), |(r, c)| {
            if labels[r] == classes[c] {
                1.0
            } else {
                0.0
            }
        });

        let indices = self.shuffled_indices(rows);
        let (test_idx, train_idx) = indices.split_at(n_test);

        let label_names = classes
            .iter()
            .map(|class| format!("{}_{class}", self.target))
            .collect();

        tracing::info!(
            train = train_idx.len(),
            test = test_idx.len(),
            features = feature_names.len(),
            classes = classes.len(),
            "split dataset"
        );

        Ok(TrainTestSplit {
            feature_names,
            label_names,
            x_train: x.select(Axis(0), train_idx),
            x_test: x.select(Axis(0), test_idx),
            y_train: y.select(Axis(0), train_idx),
            y_test: y.select(Axis(0), test_idx),
        })
    }
}
