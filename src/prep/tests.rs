//! Tests for cleaning and preprocessing

use super::*;
use crate::data::DatasetSnapshot;
use tempfile::TempDir;

fn credit_frame(rows: usize) -> DataFrame {
    let labels = ["Good", "Poor", "Standard"];
    df!(
        "Annual_Income" => (0..rows).map(|i| 1000.0 + i as f64).collect::<Vec<_>>(),
        "Num_Bank_Accounts" => (0..rows).map(|i| (i % 5) as i64).collect::<Vec<_>>(),
        "Occupation" => (0..rows).map(|i| format!("job{}", i % 2)).collect::<Vec<_>>(),
        "Credit_Score" => (0..rows).map(|i| labels[i % 3]).collect::<Vec<_>>(),
    )
    .unwrap()
}

#[test]
fn test_drop_nulls_cleaner_writes_csv() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("data/cleaned.csv");
    let frame = df!(
        "a" => &[Some(1i64), None, Some(3)],
        "b" => &[Some("x"), Some("y"), None],
    )
    .unwrap();

    let cleaned = DropNullsCleaner::new(&output).clean(&frame).unwrap();

    assert_eq!(cleaned.frame.height(), 1);
    assert_eq!(cleaned.path, output);
    let reread = DatasetSnapshot::from_csv(&output).unwrap();
    assert_eq!(reread.num_rows(), 1);
    assert_eq!(reread.num_columns(), 2);
}

#[test]
fn test_splitter_shapes_and_classes() {
    let split = OneHotSplitter::new("Credit_Score", 0.2, 42)
        .preprocess(&credit_frame(30))
        .unwrap();

    assert_eq!(split.feature_names, vec!["Annual_Income", "Num_Bank_Accounts"]);
    assert_eq!(
        split.label_names,
        vec!["Credit_Score_Good", "Credit_Score_Poor", "Credit_Score_Standard"]
    );
    assert_eq!(split.x_test.nrows(), 6);
    assert_eq!(split.x_train.nrows(), 24);
    assert_eq!(split.y_train.dim(), (24, 3));
    assert_eq!(split.y_test.dim(), (6, 3));

    for row in split.y_train.rows().into_iter().chain(split.y_test.rows()) {
        assert_eq!(row.sum(), 1.0);
    }
}

#[test]
fn test_splitter_rows_stay_aligned() {
    let split = OneHotSplitter::new("Credit_Score", 0.25, 7)
        .preprocess(&credit_frame(12))
        .unwrap();

    // Income 1000 + i pairs with label index i % 3
    for (x, y) in split.x_train.rows().into_iter().zip(split.y_train.rows()) {
        let i = (x[0] - 1000.0) as usize;
        assert_eq!(y[i % 3], 1.0);
    }
}

#[test]
fn test_splitter_is_deterministic_for_a_seed() {
    let frame = credit_frame(40);
    let a = OneHotSplitter::new("Credit_Score", 0.2, 42).preprocess(&frame).unwrap();
    let b = OneHotSplitter::new("Credit_Score", 0.2, 42).preprocess(&frame).unwrap();
    let c = OneHotSplitter::new("Credit_Score", 0.2, 43).preprocess(&frame).unwrap();
    assert_eq!(a.x_test, b.x_test);
    assert_ne!(a.x_test, c.x_test);
}

#[test]
fn test_splitter_test_size_rounds_up() {
    let split = OneHotSplitter::new("Credit_Score", 0.2, 1)
        .preprocess(&credit_frame(11))
        .unwrap();
    assert_eq!(split.x_test.nrows(), 3);
}

#[test]
fn test_splitter_errors() {
    let frame = credit_frame(10);
    assert!(matches!(
        OneHotSplitter::new("Missing", 0.2, 0).preprocess(&frame),
        Err(PrepError::MissingColumn(_))
    ));
    assert!(matches!(
        OneHotSplitter::new("Credit_Score", 1.0, 0).preprocess(&frame),
        Err(PrepError::InvalidTestSize(_))
    ));
    assert!(matches!(
        OneHotSplitter::new("Credit_Score", 0.5, 0).preprocess(&credit_frame(1)),
        Err(PrepError::NotEnoughRows { rows: 1 })
    ));

    let only_strings = df!("name" => &["a", "b"], "Credit_Score" => &["Good", "Poor"]).unwrap();
    assert!(matches!(
        OneHotSplitter::new("Credit_Score", 0.5, 0).preprocess(&only_strings),
        Err(PrepError::NoFeatures(_))
    ));
}

#[test]
fn test_training_frame_schema() {
    let split = OneHotSplitter::new("Credit_Score", 0.2, 42)
        .preprocess(&credit_frame(20))
        .unwrap();
    let snapshot = DatasetSnapshot::new(split.training_frame().unwrap());

    assert_eq!(snapshot.num_rows(), split.x_train.nrows());
    let schema = snapshot.schema();
    assert_eq!(schema.len(), 5);
    assert_eq!(schema[0].dtype, "float64");
    assert_eq!(schema[4].name, "Credit_Score_Standard");
    assert_eq!(schema[4].dtype, "uint8");
}

#[test]
fn test_ensure_classes() {
    let split = OneHotSplitter::new("Credit_Score", 0.2, 42)
        .preprocess(&credit_frame(20))
        .unwrap();
    assert!(split.ensure_classes(3).is_ok());
    assert!(matches!(
        split.ensure_classes(4),
        Err(PrepError::ClassCount { expected: 4, found: 3 })
    ));
}
