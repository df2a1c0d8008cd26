//! Tests for the evaluation entry points

use super::*;
use crate::model::{Hyperparameters, PriorClassifier};
use ndarray::array;
use proptest::prelude::*;
use tempfile::TempDir;

fn one_hot(classes: &[usize], n_classes: usize) -> Array2<f64> {
    Array2::from_shape_fn((classes.len(), n_classes), |(r, c)| {
        if classes[r] == c {
            1.0
        } else {
            0.0
        }
    })
}

#[test]
fn test_evaluate_scores_metric_keys() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("confusion_matrix.png");
    let y_true = one_hot(&[0, 1, 2, 2], 3);
    let scores = array![[0.9, 0.1, 0.0], [0.2, 0.7, 0.1], [0.1, 0.1, 0.8], [0.6, 0.3, 0.1]];

    let evaluation = evaluate_scores(&scores, &y_true, 3, &image).unwrap();

    assert!(image.exists());
    assert_eq!(evaluation.image_path, image);
    assert_eq!(evaluation.metrics.len(), 7 + 9);
    for key in [
        "test_accuracy",
        "test_macro_avg_precision",
        "test_macro_avg_recall",
        "test_macro_avg_f1",
        "test_weighted_avg_precision",
        "test_weighted_avg_recall",
        "test_weighted_avg_f1",
        "test_class_0_precision",
        "test_class_1_recall",
        "test_class_2_f1",
    ] {
        assert!(evaluation.metrics.get(key).is_some(), "missing {key}");
    }
    assert!((evaluation.metrics.accuracy() - 0.75).abs() < 1e-12);
    assert_eq!(evaluation.confusion.get(2, 0), 1);
}

#[test]
fn test_evaluate_rejects_wrong_class_count() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("cm.png");
    let y_true = one_hot(&[0, 1], 2);
    let scores = one_hot(&[0, 1], 2);

    let err = evaluate_scores(&scores, &y_true, 3, &image).unwrap_err();
    assert!(matches!(err, EvalError::ClassCount { expected: 3, found: 2, .. }));
    assert!(!image.exists());
}

#[test]
fn test_evaluate_rejects_row_mismatch() {
    let dir = TempDir::new().unwrap();
    let err = evaluate_scores(
        &one_hot(&[0, 1, 2], 3),
        &one_hot(&[0, 1], 3),
        3,
        &dir.path().join("cm.png"),
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::LengthMismatch { .. }));
}

#[test]
fn test_evaluate_with_model() {
    let dir = TempDir::new().unwrap();
    let y_train = one_hot(&[1, 1, 1, 0], 3);
    let model = PriorClassifier::fit(&y_train, 2, Hyperparameters::new()).unwrap();

    let x_test = Array2::zeros((4, 2));
    let y_test = one_hot(&[1, 0, 1, 2], 3);
    let evaluation = evaluate(&model, &x_test, &y_test, 3, &dir.path().join("cm.png")).unwrap();

    // Always predicts class 1
    assert!((evaluation.metrics.accuracy() - 0.5).abs() < 1e-12);
    assert_eq!(evaluation.metrics.get("test_class_1_recall"), Some(1.0));
    assert_eq!(evaluation.metrics.get("test_class_0_precision"), Some(0.0));
}

fn labels_and_predictions() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    (1usize..60).prop_flat_map(|n| {
        (
            proptest::collection::vec(0usize..3, n),
            proptest::collection::vec(0usize..3, n),
        )
    })
}

proptest! {
    #[test]
    fn prop_accuracy_is_argmax_agreement((truth, predicted) in labels_and_predictions()) {
        let dir = TempDir::new().unwrap();
        let y_true = one_hot(&truth, 3);
        let scores = one_hot(&predicted, 3) * 0.8 + 0.05;

        let evaluation = evaluate_scores(&scores, &y_true, 3, &dir.path().join("cm.png")).unwrap();

        let agree = truth.iter().zip(&predicted).filter(|(t, p)| t == p).count();
        let expected = agree as f64 / truth.len() as f64;
        prop_assert!((evaluation.metrics.accuracy() - expected).abs() < 1e-12);
    }

    #[test]
    fn prop_macro_and_weighted_averages((truth, predicted) in labels_and_predictions()) {
        let report = classification_report(&predicted, &truth, 3).unwrap();
        let metrics = EvaluationMetrics::from_report(&report);

        for stat in ["precision", "recall", "f1"] {
            let per_class: Vec<f64> = (0..3)
                .map(|c| metrics.get(&format!("test_class_{c}_{stat}")).unwrap())
                .collect();
            let support: Vec<f64> = report.classes.iter().map(|c| c.support as f64).collect();

            let macro_mean = per_class.iter().sum::<f64>() / 3.0;
            let weighted_mean = per_class.iter().zip(&support).map(|(v, s)| v * s).sum::<f64>()
                / support.iter().sum::<f64>();

            let macro_key = format!("test_macro_avg_{stat}");
            let weighted_key = format!("test_weighted_avg_{stat}");
            prop_assert!((metrics.get(&macro_key).unwrap() - macro_mean).abs() < 1e-12);
            prop_assert!((metrics.get(&weighted_key).unwrap() - weighted_mean).abs() < 1e-12);
        }
    }
}
