//! Model evaluation
//!
//! Turns one-hot ground truth and per-class prediction scores into a
//! confusion matrix, an sklearn-style classification report, a heatmap
//! image, and the flat [`EvaluationMetrics`] logged to the tracking server.
//!
//! ## Architecture
//!
//! - `classification`: confusion matrix, per-class metrics, reports
//! - `argmax`: score matrix to class index conversion
//! - `heatmap`: PNG rendering of the confusion matrix
//! - `summary`: flat metric mapping

pub mod argmax;
pub mod classification;
mod font;
pub mod heatmap;
pub mod summary;

use std::path::{Path, PathBuf};

use ndarray::Array2;
use thiserror::Error;

use crate::model::{Classifier, ModelError};

pub use argmax::argmax_rows;
pub use classification::{
    classification_report, confusion_matrix, Average, ClassScores, ClassificationReport,
    ConfusionMatrix, MultiClassMetrics,
};
pub use heatmap::render_confusion_matrix;
pub use summary::EvaluationMetrics;

/// Errors from evaluation
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{predictions} predictions but {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },

    #[error("label {label} outside the label space of {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("{what} has {found} columns, expected {expected} (one per class)")]
    ClassCount {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),

    #[error("failed to render confusion matrix: {0}")]
    Render(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Everything produced by one evaluation
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub metrics: EvaluationMetrics,
    /// Where the heatmap was written
    pub image_path: PathBuf,
}

/// Predict on `x_test` and evaluate against one-hot `y_test`
pub fn evaluate(
    model: &dyn Classifier,
    x_test: &Array2<f64>,
    y_test: &Array2<f64>,
    n_classes: usize,
    image_path: &Path,
) -> Result<Evaluation> {
    let scores = model.predict(x_test)?;
    evaluate_scores(&scores, y_test, n_classes, image_path)
}

/// Evaluate prediction scores against one-hot labels
///
/// Both matrices must have one column per class. The heatmap is written to
/// `image_path`.
pub fn evaluate_scores(
    scores: &Array2<f64>,
    y_true: &Array2<f64>,
    n_classes: usize,
    image_path: &Path,
) -> Result<Evaluation> {
    check_width("prediction matrix", scores, n_classes)?;
    check_width("label matrix", y_true, n_classes)?;

    let y_pred_classes = argmax_rows(scores);
    let y_true_classes = argmax_rows(y_true);

    let confusion = ConfusionMatrix::from_predictions(&y_pred_classes, &y_true_classes, n_classes)?;
    let report = ClassificationReport::from_confusion_matrix(&confusion);
    let metrics = EvaluationMetrics::from_report(&report);

    render_confusion_matrix(&confusion, image_path)?;

    tracing::info!(
        samples = confusion.total(),
        accuracy = report.accuracy,
        "evaluation complete"
    );

    Ok(Evaluation {
        confusion,
        report,
        metrics,
        image_path: image_path.to_path_buf(),
    })
}

fn check_width(what: &'static str, matrix: &Array2<f64>, expected: usize) -> Result<()> {
    if matrix.ncols() != expected {
        return Err(EvalError::ClassCount {
            what,
            expected,
            found: matrix.ncols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
