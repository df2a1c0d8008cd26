//! Classification report

use std::fmt;

use serde::{Deserialize, Serialize};

use super::average::Average;
use super::confusion::ConfusionMatrix;
use super::metrics::MultiClassMetrics;
use crate::eval::Result;

/// Precision / recall / F1 / support for one row of the report
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// sklearn-style classification report
///
/// Holds per-class rows, overall accuracy, and the macro and weighted
/// averages, in the same shape as `classification_report(output_dict=True)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

impl ClassificationReport {
    /// Build the report from a confusion matrix
    pub fn from_confusion_matrix(cm: &ConfusionMatrix) -> Self {
        let metrics = MultiClassMetrics::from_confusion_matrix(cm);
        let total_support = metrics.total_support();

        let classes = (0..metrics.n_classes)
            .map(|class| ClassScores {
                precision: metrics.precision[class],
                recall: metrics.recall[class],
                f1: metrics.f1[class],
                support: metrics.support[class],
            })
            .collect();

        let averaged = |average: Average| ClassScores {
            precision: metrics.precision_avg(average),
            recall: metrics.recall_avg(average),
            f1: metrics.f1_avg(average),
            support: total_support,
        };

        Self {
            classes,
            accuracy: cm.accuracy(),
            macro_avg: averaged(Average::Macro),
            weighted_avg: averaged(Average::Weighted),
        }
    }

    /// Number of classes in the label space
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Row for one class
    pub fn class(&self, class: usize) -> Option<&ClassScores> {
        self.classes.get(class)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f, "{}", "-".repeat(54))?;

        for (class, scores) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                class, scores.precision, scores.recall, scores.f1, scores.support
            )?;
        }

        writeln!(f, "{}", "-".repeat(54))?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (label, scores) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, scores.precision, scores.recall, scores.f1, scores.support
            )?;
        }

        Ok(())
    }
}

/// Compute confusion matrix from predictions and ground truth
///
/// # Example
/// ```
/// use credit_pipeline::eval::confusion_matrix;
///
/// let y_pred = vec![0, 1, 1, 2, 0];
/// let y_true = vec![0, 1, 0, 2, 1];
/// let cm = confusion_matrix(&y_pred, &y_true, 3).unwrap();
///
/// assert_eq!(cm.get(0, 0), 1);  // True 0, predicted 0
/// assert_eq!(cm.get(0, 1), 1);  // True 0, predicted 1
/// ```
pub fn confusion_matrix(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Result<ConfusionMatrix> {
    ConfusionMatrix::from_predictions(y_pred, y_true, n_classes)
}

/// Generate an sklearn-style classification report
pub fn classification_report(
    y_pred: &[usize],
    y_true: &[usize],
    n_classes: usize,
) -> Result<ClassificationReport> {
    let cm = ConfusionMatrix::from_predictions(y_pred, y_true, n_classes)?;
    Ok(ClassificationReport::from_confusion_matrix(&cm))
}
