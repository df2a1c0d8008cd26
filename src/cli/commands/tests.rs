//! CLI command tests

use super::*;
use crate::cli::LogLevel;
use crate::config::*;
use crate::ledger::FeatureLedger;
use crate::tracking::JsonFileBackend;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_credit_csv(dir: &Path) -> PathBuf {
    let path = dir.join("train.csv");
    let mut csv = String::from("Age,Annual_Income,Num_Bank_Accounts,Credit_Score\n");
    let classes = ["Good", "Poor", "Standard"];
    for i in 0..30 {
        csv.push_str(&format!(
            "{},{}.5,{},{}\n",
            20 + i,
            1000 * (i + 1),
            i % 4,
            classes[i % 3]
        ));
    }
    // One row with a missing income, dropped by the cleaner
    csv.push_str("55,,2,Good\n");
    std::fs::write(&path, csv).unwrap();
    path
}

fn write_run_config(dir: &Path) -> PathBuf {
    let data = write_credit_csv(dir);
    let config_path = dir.join("pipeline.yaml");
    let config = format!(
        r#"
tracking:
  experiment: cli_test
  backend: local
  local_dir: {root}/mlruns
data:
  path: {data}
  cleaned_path: {root}/data/cleaned.csv
ledger:
  path: {root}/features.yaml
artifacts:
  model_dir: {root}/model_artifacts
  confusion_matrix: {root}/confusion_matrix.png
  temp_model: {root}/temp_model.json
training:
  tuning_epochs: 1
  final_epochs: 1
"#,
        root = dir.display(),
        data = data.display(),
    );
    std::fs::write(&config_path, config).unwrap();
    config_path
}

fn cli(command: Command) -> Cli {
    Cli {
        command,
        verbose: false,
        quiet: true,
    }
}

#[test]
fn test_run_command_local_tracking() {
    let dir = TempDir::new().unwrap();
    let config = write_run_config(dir.path());

    let result = run_command(cli(Command::Run(RunArgs {
        config: Some(config),
        ..RunArgs::default()
    })));
    assert!(result.is_ok(), "{result:?}");

    assert!(!dir.path().join("model_artifacts/model_config.yaml").exists());
    assert!(dir
        .path()
        .join("model_artifacts/credit_score_model_tuned.json")
        .exists());
    assert!(!dir.path().join("temp_model.json").exists());
    assert!(!dir.path().join("confusion_matrix.png").exists());

    let document = FeatureLedger::new(dir.path().join("features.yaml"))
        .load()
        .unwrap();
    assert_eq!(document.len(), 3);

    let backend = JsonFileBackend::new(dir.path().join("mlruns"));
    let runs = backend.list_runs().unwrap();
    assert_eq!(runs.len(), 3);
    let main = runs
        .iter()
        .find(|run| run.run_name == crate::pipeline::MAIN_RUN_NAME)
        .unwrap();
    assert!(main.artifact("features.yaml").is_some());
    assert!(main.artifact("pipeline.yaml").is_some());
}

#[test]
fn test_run_command_experiment_override_after_invalid_file_value() {
    let dir = TempDir::new().unwrap();
    let config = write_run_config(dir.path());
    let yaml = std::fs::read_to_string(&config)
        .unwrap()
        .replace("experiment: cli_test", "experiment: \"\"");
    std::fs::write(&config, yaml).unwrap();

    let rejected = run_command(cli(Command::Run(RunArgs {
        config: Some(config.clone()),
        ..RunArgs::default()
    })));
    assert!(rejected.unwrap_err().contains("Config error"));

    let result = run_command(cli(Command::Run(RunArgs {
        config: Some(config),
        experiment: Some("from_cli".to_string()),
        ..RunArgs::default()
    })));
    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn test_run_command_local_tracking_override() {
    let dir = TempDir::new().unwrap();
    let config = write_run_config(dir.path());
    let elsewhere = dir.path().join("elsewhere");

    let result = run_command(cli(Command::Run(RunArgs {
        config: Some(config),
        local_tracking: Some(elsewhere.clone()),
        ..RunArgs::default()
    })));
    assert!(result.is_ok(), "{result:?}");

    let backend = JsonFileBackend::new(&elsewhere);
    assert_eq!(backend.list_runs().unwrap().len(), 3);
}

#[test]
fn test_run_command_missing_config() {
    let result = run_command(cli(Command::Run(RunArgs {
        config: Some(PathBuf::from("/nonexistent/pipeline.yaml")),
        ..RunArgs::default()
    })));
    let err = result.unwrap_err();
    assert!(err.contains("Config error"), "{err}");
}

#[test]
fn test_run_command_missing_data() {
    let dir = TempDir::new().unwrap();
    let config = write_run_config(dir.path());

    let result = run_command(cli(Command::Run(RunArgs {
        config: Some(config),
        data: Some(dir.path().join("missing.csv")),
        ..RunArgs::default()
    })));
    assert!(result.is_err());
    assert!(!dir.path().join("features.yaml").exists());
}

#[test]
fn test_ledger_record_show_purge() {
    let dir = TempDir::new().unwrap();
    let csv = write_credit_csv(dir.path());
    let ledger = dir.path().join("features.yaml");

    let record = |name: &str| {
        run_command(cli(Command::Ledger(LedgerArgs {
            command: LedgerCommand::Record(LedgerRecordArgs {
                csv: csv.clone(),
                name: name.to_string(),
                description: "raw upload".to_string(),
                ledger: ledger.clone(),
            }),
        })))
    };
    record("Initial Features").unwrap();
    record("Second Look").unwrap();

    let document = FeatureLedger::new(&ledger).load().unwrap();
    assert_eq!(document.len(), 2);
    let entry = document.entry("Initial Features").unwrap();
    assert_eq!(entry.num_features, 4);
    assert_eq!(entry.description, "raw upload");

    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
        let shown = run_command(cli(Command::Ledger(LedgerArgs {
            command: LedgerCommand::Show(LedgerShowArgs {
                ledger: ledger.clone(),
                format,
            }),
        })));
        assert!(shown.is_ok());
    }

    let purge = || {
        run_command(cli(Command::Ledger(LedgerArgs {
            command: LedgerCommand::Purge(LedgerPurgeArgs {
                ledger: ledger.clone(),
            }),
        })))
    };
    purge().unwrap();
    assert!(!ledger.exists());
    // Purging an absent ledger is not an error
    purge().unwrap();
}

#[test]
fn test_ledger_record_missing_csv() {
    let dir = TempDir::new().unwrap();
    let result = run_command(cli(Command::Ledger(LedgerArgs {
        command: LedgerCommand::Record(LedgerRecordArgs {
            csv: dir.path().join("missing.csv"),
            name: "Initial Features".to_string(),
            description: String::new(),
            ledger: dir.path().join("features.yaml"),
        }),
    })));
    assert!(result.unwrap_err().contains("Failed to load"));
    assert!(!dir.path().join("features.yaml").exists());
}

#[test]
fn test_ledger_show_empty() {
    let dir = TempDir::new().unwrap();
    let result = run_command(cli(Command::Ledger(LedgerArgs {
        command: LedgerCommand::Show(LedgerShowArgs {
            ledger: dir.path().join("features.yaml"),
            format: OutputFormat::Text,
        }),
    })));
    assert!(result.is_ok());
}

#[test]
fn test_ledger_text_lines() {
    let dir = TempDir::new().unwrap();
    let csv = write_credit_csv(dir.path());
    let snapshot = crate::data::DatasetSnapshot::from_csv(&csv).unwrap();
    let ledger = FeatureLedger::new(dir.path().join("features.yaml"));
    ledger.record(&snapshot, "Initial Features", "raw").unwrap();
    let document = ledger.load().unwrap();

    let brief = super::ledger::text_lines(&document, false);
    assert_eq!(brief, vec!["Initial Features: 4 features - raw".to_string()]);

    let detailed = super::ledger::text_lines(&document, true);
    assert_eq!(detailed.len(), 5);
    assert!(detailed[1].trim_start().starts_with("Age"));
}

#[test]
fn test_ledger_render_document_formats() {
    let dir = TempDir::new().unwrap();
    let csv = write_credit_csv(dir.path());
    let snapshot = crate::data::DatasetSnapshot::from_csv(&csv).unwrap();
    let ledger = FeatureLedger::new(dir.path().join("features.yaml"));
    ledger.record(&snapshot, "Initial Features", "raw").unwrap();
    let document = ledger.load().unwrap();

    let text = super::ledger::render_document(&document, OutputFormat::Text, false).unwrap();
    assert_eq!(text, "Initial Features: 4 features - raw");

    let json = super::ledger::render_document(&document, OutputFormat::Json, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["Initial Features"]["num_features"], 4);

    let yaml = super::ledger::render_document(&document, OutputFormat::Yaml, false).unwrap();
    assert!(yaml.starts_with("Initial Features:"));
    assert!(!yaml.ends_with('\n'));
}

#[test]
fn test_quiet_suppresses_all_output() {
    use crate::cli::logging::should_print;

    for required in [LogLevel::Normal, LogLevel::Verbose] {
        assert!(!should_print(LogLevel::Quiet, required));
    }
    assert!(should_print(LogLevel::Normal, LogLevel::Normal));
    assert!(!should_print(LogLevel::Normal, LogLevel::Verbose));
    assert!(should_print(LogLevel::Verbose, LogLevel::Normal));
    assert!(should_print(LogLevel::Verbose, LogLevel::Verbose));
}

fn write_matrix(path: &Path, rows: &[[f64; 3]]) {
    let mut csv = String::from("c0,c1,c2\n");
    for row in rows {
        csv.push_str(&format!("{},{},{}\n", row[0], row[1], row[2]));
    }
    std::fs::write(path, csv).unwrap();
}

#[test]
fn test_evaluate_command() {
    let dir = TempDir::new().unwrap();
    let labels = dir.path().join("labels.csv");
    let predictions = dir.path().join("predictions.csv");
    let output = dir.path().join("cm.png");
    write_matrix(
        &labels,
        &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]],
    );
    write_matrix(
        &predictions,
        &[[0.8, 0.1, 0.1], [0.2, 0.7, 0.1], [0.1, 0.2, 0.7], [0.6, 0.3, 0.1]],
    );

    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
        let result = run_command(cli(Command::Evaluate(EvaluateArgs {
            labels: labels.clone(),
            predictions: predictions.clone(),
            output: output.clone(),
            num_classes: 3,
            format,
        })));
        assert!(result.is_ok(), "{result:?}");
    }
    assert!(output.exists());
}

#[test]
fn test_evaluate_command_wrong_class_count() {
    let dir = TempDir::new().unwrap();
    let labels = dir.path().join("labels.csv");
    let predictions = dir.path().join("predictions.csv");
    write_matrix(&labels, &[[1.0, 0.0, 0.0]]);
    write_matrix(&predictions, &[[0.8, 0.1, 0.1]]);

    let result = run_command(cli(Command::Evaluate(EvaluateArgs {
        labels,
        predictions,
        output: dir.path().join("cm.png"),
        num_classes: 4,
        format: OutputFormat::Text,
    })));
    assert!(result.unwrap_err().contains("Evaluation failed"));
}

#[test]
fn test_metric_lines_four_decimals() {
    let mut map = std::collections::BTreeMap::new();
    map.insert("test_accuracy".to_string(), 0.5);
    let metrics: crate::eval::EvaluationMetrics =
        serde_json::from_value(serde_json::to_value(map).unwrap()).unwrap();
    assert_eq!(super::run::metric_lines(&metrics), vec!["test_accuracy: 0.5000"]);
}

#[test]
fn test_log_level_from_cli_flags() {
    assert_eq!(LogLevel::from_flags(true, false), LogLevel::Verbose);
    assert_eq!(LogLevel::from_flags(false, true), LogLevel::Quiet);
    assert_eq!(LogLevel::from_flags(false, false), LogLevel::Normal);
}
