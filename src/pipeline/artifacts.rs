//! Local files written during a training session
//!
//! Everything uploaded from the training run is first written locally. The
//! [`TempArtifacts`] guard owns those paths: they are removed at the end of
//! a successful session and, failing that, when the guard is dropped.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::eval::EvaluationMetrics;
use crate::model::Hyperparameters;

/// Timestamp format of the model config document
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Temporary files that must not outlive the session that made them
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `path`; returns it for convenience
    ///
    /// Register a path before writing it so a failed write is cleaned up too.
    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path.clone());
        }
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every tracked file, returning how many were removed
    ///
    /// Files that are already gone are logged, not treated as errors.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            if remove_quietly(&path) {
                removed += 1;
            }
        }
        removed
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            tracing::debug!(files = self.paths.len(), "removing temporary artifacts on drop");
            self.cleanup();
        }
    }
}

fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed temporary artifact");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("{} does not exist.", path.display());
            false
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary artifact");
            false
        }
    }
}

/// `model_config.yaml`: what was trained, how well it did, and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfigDocument {
    pub hyperparameters: Hyperparameters,
    pub metrics: EvaluationMetrics,
    pub timestamp: String,
}

impl ModelConfigDocument {
    /// Document stamped with the current local time
    pub fn now(hyperparameters: &Hyperparameters, metrics: &EvaluationMetrics) -> Self {
        Self {
            hyperparameters: hyperparameters.clone(),
            metrics: metrics.clone(),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Write the model config document to `path`, creating parent directories
pub fn write_model_config(
    path: &Path,
    hyperparameters: &Hyperparameters,
    metrics: &EvaluationMetrics,
) -> crate::Result<ModelConfigDocument> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let document = ModelConfigDocument::now(hyperparameters, metrics);
    fs::write(path, serde_yaml::to_string(&document)?)?;
    Ok(document)
}
