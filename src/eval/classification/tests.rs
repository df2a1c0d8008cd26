//! Tests for classification metrics

use super::*;
use crate::eval::EvalError;

#[test]
fn test_confusion_matrix_basic() {
    let y_pred = vec![0, 1, 1, 2, 0, 1];
    let y_true = vec![0, 1, 0, 2, 0, 2];
    let cm = confusion_matrix(&y_pred, &y_true, 3).unwrap();

    assert_eq!(cm.n_classes(), 3);
    assert_eq!(cm.get(0, 0), 2); // True 0, predicted 0
    assert_eq!(cm.get(0, 1), 1); // True 0, predicted 1
    assert_eq!(cm.get(1, 1), 1); // True 1, predicted 1
    assert_eq!(cm.get(2, 1), 1); // True 2, predicted 1
    assert_eq!(cm.get(2, 2), 1); // True 2, predicted 2
    assert_eq!(cm.max_count(), 2);
}

#[test]
fn test_confusion_matrix_fixed_label_space() {
    // Class 2 never appears but still gets a row and column
    let cm = confusion_matrix(&[0, 1, 1], &[0, 1, 0], 3).unwrap();
    assert_eq!(cm.n_classes(), 3);
    assert_eq!(cm.support(2), 0);
    assert_eq!(cm.matrix()[2], vec![0, 0, 0]);
}

#[test]
fn test_confusion_matrix_length_mismatch() {
    let err = confusion_matrix(&[0, 1], &[0], 3).unwrap_err();
    assert!(matches!(err, EvalError::LengthMismatch { predictions: 2, labels: 1 }));
}

#[test]
fn test_confusion_matrix_label_out_of_range() {
    let err = confusion_matrix(&[0, 3], &[0, 1], 3).unwrap_err();
    assert!(matches!(err, EvalError::LabelOutOfRange { label: 3, n_classes: 3 }));
}

#[test]
fn test_confusion_matrix_tp_fp_fn() {
    let y_pred = vec![1, 1, 0, 1];
    let y_true = vec![1, 0, 0, 1];
    let cm = confusion_matrix(&y_pred, &y_true, 2).unwrap();

    assert_eq!(cm.true_positives(1), 2);
    assert_eq!(cm.false_positives(1), 1);
    assert_eq!(cm.false_negatives(1), 0);

    assert_eq!(cm.true_positives(0), 1);
    assert_eq!(cm.false_positives(0), 0);
    assert_eq!(cm.false_negatives(0), 1);
}

#[test]
fn test_empty_input() {
    let cm = confusion_matrix(&[], &[], 3).unwrap();
    assert_eq!(cm.total(), 0);
    assert_eq!(cm.accuracy(), 0.0);
    assert_eq!(cm.max_count(), 0);
}

#[test]
fn test_multiclass_metrics() {
    let cm = confusion_matrix(&[0, 1, 1, 2, 0], &[0, 1, 0, 2, 1], 3).unwrap();
    let metrics = MultiClassMetrics::from_confusion_matrix(&cm);

    // Class 0: TP=1, FP=1, FN=1 -> P=0.5, R=0.5
    assert!((metrics.precision[0] - 0.5).abs() < 1e-6);
    assert!((metrics.recall[0] - 0.5).abs() < 1e-6);

    // Class 2: TP=1, FP=0, FN=0 -> P=1, R=1, F1=1
    assert!((metrics.f1[2] - 1.0).abs() < 1e-6);
    assert_eq!(metrics.support, vec![2, 2, 1]);
}

#[test]
fn test_absent_class_scores_zero() {
    let cm = confusion_matrix(&[0, 0], &[0, 1], 3).unwrap();
    let metrics = MultiClassMetrics::from_confusion_matrix(&cm);
    assert_eq!(metrics.precision[1], 0.0);
    assert_eq!(metrics.recall[2], 0.0);
    assert_eq!(metrics.f1[2], 0.0);
}

#[test]
fn test_report_shape() {
    let report = classification_report(&[0, 1, 1, 2, 0], &[0, 1, 0, 2, 1], 3).unwrap();
    assert_eq!(report.n_classes(), 3);
    assert_eq!(report.class(2).unwrap().support, 1);
    assert!(report.class(3).is_none());
    assert_eq!(report.macro_avg.support, 5);
    assert_eq!(report.weighted_avg.support, 5);
    // Weighted F1: (0.5*2 + 0.5*2 + 1.0*1) / 5
    assert!((report.weighted_avg.f1 - 0.6).abs() < 1e-9);
}

#[test]
fn test_report_display() {
    let report = classification_report(&[0, 1, 1, 2, 0, 1], &[0, 1, 0, 2, 0, 2], 3).unwrap();
    let text = report.to_string();

    assert!(text.contains("precision"));
    assert!(text.contains("recall"));
    assert!(text.contains("f1-score"));
    assert!(text.contains("support"));
    assert!(text.contains("accuracy"));
    assert!(text.contains("macro avg"));
    assert!(text.contains("weighted avg"));
}

#[test]
fn test_confusion_display() {
    let cm = confusion_matrix(&[0, 1, 0], &[0, 1, 1], 2).unwrap();
    let display = format!("{cm}");
    assert!(display.contains("Confusion Matrix"));
    assert!(display.contains("Pred 1"));
    assert!(display.contains("True 1"));
}

// sklearn reference values, computed with sklearn 1.4.0:
//   from sklearn.metrics import classification_report
//   classification_report(y_true, y_pred, output_dict=True)

#[test]
fn test_sklearn_parity_balanced() {
    let y_true = vec![0, 0, 1, 1, 2, 2, 0, 1, 2];
    let y_pred = vec![0, 1, 1, 2, 2, 0, 0, 1, 2];
    let report = classification_report(&y_pred, &y_true, 3).unwrap();

    let expected = 0.6666666666666666;
    assert!((report.accuracy - expected).abs() < 1e-6);
    for scores in [report.macro_avg, report.weighted_avg] {
        assert!((scores.precision - expected).abs() < 1e-6);
        assert!((scores.recall - expected).abs() < 1e-6);
        assert!((scores.f1 - expected).abs() < 1e-6);
    }
}

#[test]
fn test_sklearn_parity_imbalanced() {
    // class 0: P=0.75 R=0.6; class 1: P=1/3 R=0.5; class 2: P=1 R=1
    let y_true = vec![0, 0, 0, 0, 0, 1, 1, 2];
    let y_pred = vec![0, 0, 0, 1, 1, 1, 0, 2];
    let report = classification_report(&y_pred, &y_true, 3).unwrap();

    assert!((report.accuracy - 0.625).abs() < 1e-6);
    assert!((report.macro_avg.f1 - 0.6888888888888888).abs() < 1e-6);
    assert!((report.weighted_avg.f1 - 0.6416666666666666).abs() < 1e-6);
    assert!((report.macro_avg.precision - 0.6944444444444445).abs() < 1e-6);
    assert!((report.weighted_avg.recall - 0.625).abs() < 1e-6);
}
