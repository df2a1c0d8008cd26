//! Run command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, PipelineConfig, RunArgs};
use crate::eval::EvaluationMetrics;
use crate::pipeline::{Collaborators, Pipeline, PipelineReport};
use crate::tracking::{open_backend, ExperimentTracker};

pub fn run_pipeline(args: RunArgs, level: LogLevel) -> Result<(), String> {
    let mut config = PipelineConfig::load(args.config.as_deref())
        .map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut config, &args);
    config.validate().map_err(|e| format!("Config error: {e}"))?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Tracking experiment '{}' ({:?})",
            config.tracking.experiment, config.tracking.backend
        ),
    );

    let backend = open_backend(&config.tracking).map_err(|e| format!("Tracking error: {e}"))?;
    let tracker = ExperimentTracker::new(&config.tracking.experiment, backend)
        .map_err(|e| format!("Tracking error: {e}"))?;
    let collaborators = Collaborators::defaults(&config);
    let model_dir = config.artifacts.model_dir.clone();

    let report = Pipeline::new(config, tracker, collaborators)
        .run()
        .map_err(|e| e.to_string())?;

    print_report(&report, &model_dir.display().to_string(), level);
    Ok(())
}

fn print_report(report: &PipelineReport, model_dir: &str, level: LogLevel) {
    log(level, LogLevel::Normal, "\nModel training completed!");
    log(level, LogLevel::Normal, &format!("Model and configuration saved in: {model_dir}"));
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Registered {} version {} from run {} (main run {})",
            report.model_version.name,
            report.model_version.version,
            report.training_run_id,
            report.main_run_id
        ),
    );
    log(level, LogLevel::Normal, "\nModel Performance Metrics:");
    for line in metric_lines(&report.metrics) {
        log(level, LogLevel::Normal, &line);
    }
}

/// `name: value` lines with four decimals
pub(crate) fn metric_lines(metrics: &EvaluationMetrics) -> Vec<String> {
    metrics
        .iter()
        .map(|(name, value)| format!("{name}: {value:.4}"))
        .collect()
}
