//! Evaluate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{EvaluateArgs, OutputFormat};
use crate::data::load_matrix;
use crate::eval::evaluate_scores;

use super::run::metric_lines;

pub fn run_evaluate(args: EvaluateArgs, level: LogLevel) -> Result<(), String> {
    let labels = load_matrix(&args.labels)
        .map_err(|e| format!("Failed to load labels {}: {e}", args.labels.display()))?;
    let predictions = load_matrix(&args.predictions).map_err(|e| {
        format!("Failed to load predictions {}: {e}", args.predictions.display())
    })?;

    let evaluation = evaluate_scores(&predictions, &labels, args.num_classes, &args.output)
        .map_err(|e| format!("Evaluation failed: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, &evaluation.confusion.to_string());
            log(level, LogLevel::Normal, &evaluation.report.to_string());
            for line in metric_lines(&evaluation.metrics) {
                log(level, LogLevel::Verbose, &line);
            }
            log(
                level,
                LogLevel::Normal,
                &format!("Confusion matrix saved to {}", evaluation.image_path.display()),
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&evaluation.metrics)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            log(level, LogLevel::Normal, &json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&evaluation.metrics)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            log(level, LogLevel::Normal, yaml.trim_end());
        }
    }
    Ok(())
}
