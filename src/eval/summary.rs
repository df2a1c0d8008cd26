//! Flat metric mapping logged to the tracking server

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classification::{ClassScores, ClassificationReport};

/// Scalar evaluation metrics keyed by name
///
/// Keys: `test_accuracy`, `test_{macro,weighted}_avg_{precision,recall,f1}`,
/// and `test_class_{i}_{precision,recall,f1}` for every class in the label
/// space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationMetrics(BTreeMap<String, f64>);

impl EvaluationMetrics {
    /// Flatten a classification report
    pub fn from_report(report: &ClassificationReport) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert("test_accuracy".to_string(), report.accuracy);

        let mut put = |prefix: &str, scores: &ClassScores| {
            metrics.insert(format!("{prefix}_precision"), scores.precision);
            metrics.insert(format!("{prefix}_recall"), scores.recall);
            metrics.insert(format!("{prefix}_f1"), scores.f1);
        };
        put("test_macro_avg", &report.macro_avg);
        put("test_weighted_avg", &report.weighted_avg);
        for (class, scores) in report.classes.iter().enumerate() {
            put(&format!("test_class_{class}"), scores);
        }

        Self(metrics)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn accuracy(&self) -> f64 {
        self.get("test_accuracy").unwrap_or_default()
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
