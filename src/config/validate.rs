use super::{ConfigError, PipelineConfig, Result};

/// Reject configurations the pipeline cannot run with
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    let invalid = |msg: String| Err(ConfigError::Invalid(msg));

    let test_size = config.data.test_size;
    if !(test_size > 0.0 && test_size < 1.0) {
        return invalid(format!("data.test_size must be in (0, 1), got {test_size}"));
    }
    if config.training.num_classes < 2 {
        return invalid(format!(
            "training.num_classes must be at least 2, got {}",
            config.training.num_classes
        ));
    }
    if config.training.batch_size == 0 {
        return invalid("training.batch_size must be positive".to_string());
    }
    if config.tracking.experiment.trim().is_empty() {
        return invalid("tracking.experiment must not be empty".to_string());
    }
    if config.data.target.trim().is_empty() {
        return invalid("data.target must not be empty".to_string());
    }
    Ok(())
}
