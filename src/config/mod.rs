//! Pipeline configuration
//!
//! A YAML file deserialized into [`PipelineConfig`], then overridden from the
//! command line and validated.

pub mod cli;
mod schema;
mod validate;


use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use cli::{
    apply_overrides, parse_args, Cli, Command, EvaluateArgs, LedgerArgs, LedgerCommand,
    LedgerPurgeArgs, LedgerRecordArgs, LedgerShowArgs, OutputFormat, RunArgs,
};
pub use schema::{
    ArtifactsConfig, BackendKind, DataConfig, LedgerConfig, PipelineConfig, TrackingConfig,
    TrainingConfig,
};
pub use validate::validate_config;

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate a configuration file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<PipelineConfig> {
    let config = read_config(config_path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a configuration file without validating it
///
/// Callers that layer command-line overrides on top validate afterwards.
pub fn read_config<P: AsRef<Path>>(config_path: P) -> Result<PipelineConfig> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: PipelineConfig = if yaml_content.trim().is_empty() {
        PipelineConfig::default()
    } else {
        serde_yaml::from_str(&yaml_content)?
    };
    Ok(config)
}

impl PipelineConfig {
    /// Configuration from `path`, or the defaults when none is given
    ///
    /// Not validated; call [`PipelineConfig::validate`] once overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => read_config(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}
