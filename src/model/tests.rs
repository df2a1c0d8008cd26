//! Tests for model extension points and baselines

use super::*;
use ndarray::array;
use tempfile::TempDir;

fn fixed_hyperparameters() -> Hyperparameters {
    Hyperparameters::new()
        .with("param_1", "64")
        .with("param_2", "relu")
        .with("param_3", "0.2")
        .with("param_4", "0.001")
}

#[test]
fn test_final_model_name() {
    let name = fixed_hyperparameters().final_model_name().unwrap();
    assert_eq!(name, "BEST_MODEL_d64_relu_0.2_lr0.001");
}

#[test]
fn test_final_model_name_missing_key() {
    let hp = Hyperparameters::new().with("param_1", "1");
    let err = hp.final_model_name().unwrap_err();
    assert!(matches!(err, ModelError::MissingHyperparameter(k) if k == "param_2"));
}

#[test]
fn test_hyperparameters_yaml_is_flat() {
    let yaml = serde_yaml::to_string(&fixed_hyperparameters()).unwrap();
    assert!(yaml.contains("param_2: relu"));
    let back: std::collections::BTreeMap<String, String> = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(&back, fixed_hyperparameters().as_map());
}

#[test]
fn test_fixed_search_defaults() {
    let x = Array2::<f64>::zeros((2, 2));
    let y = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let outcome = FixedSearch::default().search(&x, &y, 10).unwrap();

    assert_eq!(outcome.search_space.len(), 3);
    assert_eq!(outcome.search_space["param_3"], "param_3");
    assert_eq!(outcome.best.len(), 4);
    assert_eq!(
        outcome.best.final_model_name().unwrap(),
        "BEST_MODEL_dparam_1_param_2_param_3_lrparam_4"
    );
}

#[test]
fn test_prior_classifier_fit_and_predict() {
    let x = Array2::<f64>::zeros((4, 2));
    let y = array![
        [1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0]
    ];
    let options = FitOptions { epochs: 1, batch_size: 2 };
    let model = PriorTrainer.fit(&x, &y, &Hyperparameters::new(), &options).unwrap();

    let scores = model.predict(&Array2::zeros((3, 2))).unwrap();
    assert_eq!(scores.dim(), (3, 3));
    assert!((scores[[0, 0]] - 0.5).abs() < 1e-12);
    assert!((scores[[2, 1]] - 0.25).abs() < 1e-12);
    assert_eq!(model.kind(), "class-prior");
}

#[test]
fn test_prior_classifier_rejects_feature_mismatch() {
    let y = array![[1.0, 0.0], [0.0, 1.0]];
    let model = PriorClassifier::fit(&y, 3, Hyperparameters::new()).unwrap();
    assert!(model.predict(&Array2::zeros((1, 2))).is_err());
}

#[test]
fn test_prior_trainer_rejects_row_mismatch() {
    let x = Array2::<f64>::zeros((3, 1));
    let y = array![[1.0, 0.0]];
    let options = FitOptions { epochs: 1, batch_size: 1 };
    assert!(PriorTrainer.fit(&x, &y, &Hyperparameters::new(), &options).is_err());
}

#[test]
fn test_prior_classifier_rejects_zero_labels() {
    let y = Array2::<f64>::zeros((2, 3));
    assert!(PriorClassifier::fit(&y, 1, Hyperparameters::new()).is_err());
}

#[test]
fn test_prior_classifier_save_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("models/model.json");
    let y = array![[0.0, 1.0], [0.0, 1.0], [1.0, 0.0]];
    let model = PriorClassifier::fit(&y, 4, fixed_hyperparameters()).unwrap();

    model.save(&path).unwrap();
    let loaded = PriorClassifier::load(&path).unwrap();
    assert_eq!(loaded, model);
}
