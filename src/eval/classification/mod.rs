//! Classification metrics for model evaluation
//!
//! Provides multi-class classification metrics including:
//! - Confusion matrix computation over a fixed label space
//! - Per-class precision, recall, F1
//! - Macro and weighted averaging
//! - sklearn-style classification reports

mod average;
mod confusion;
mod metrics;
mod report;

#[cfg(test)]
mod tests;

pub use average::Average;
pub use confusion::ConfusionMatrix;
pub use metrics::MultiClassMetrics;
pub use report::{classification_report, confusion_matrix, ClassScores, ClassificationReport};
