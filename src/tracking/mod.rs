//! Experiment Tracking Module
//!
//! Run lifecycle, parameter/metric/artifact logging and model registration
//! against a tracking server. Persistence is pluggable via the
//! [`TrackingBackend`](storage::TrackingBackend) trait.
//!
//! # Architecture
//!
//! - **`ExperimentTracker`**: handle for one named experiment; owns the stack
//!   of active runs, so a run started while another is active nests under it
//! - **`RunSession`**: the caller's handle on an open run
//! - **`TrackingBackend`**: the server (MLflow REST, JSON files, in-memory)
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use credit_pipeline::tracking::{ExperimentTracker, RunStatus, TrackingError};
//! use credit_pipeline::tracking::storage::InMemoryBackend;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = ExperimentTracker::new("my-experiment", InMemoryBackend::new())?;
//!
//! tracker.with_run("main-run", false, |tracker, _main| {
//!     tracker.with_run("child", true, |tracker, _child| {
//!         let metrics = BTreeMap::from([("loss".to_string(), 0.3)]);
//!         tracker.log_metrics(&metrics)
//!     })
//! })?;
//!
//! let child = tracker.backend().find_run("child").unwrap();
//! assert_eq!(child.status, RunStatus::Finished);
//! assert_eq!(child.parent_run_id.as_deref(), Some("run-1"));
//! assert!(tracker.active_run().is_none());
//! # Ok(())
//! # }
//! ```

pub mod mlflow;
pub mod storage;


use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{BackendKind, TrackingConfig};
use storage::{TrackingBackend, TrackingStorageError};

pub use mlflow::MlflowBackend;
pub use storage::{InMemoryBackend, JsonFileBackend};

/// Status of a tracking run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
    Killed,
}

/// Identity of a run as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub run_name: String,
    pub experiment_id: String,
    pub parent_run_id: Option<String>,
    /// Where the server keeps this run's artifacts, when it says
    pub artifact_uri: Option<String>,
}

/// A registered model version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: String,
    pub source: String,
    pub run_id: String,
}

/// Handle on an open run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSession {
    info: RunInfo,
}

impl RunSession {
    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    pub fn run_id(&self) -> &str {
        &self.info.run_id
    }

    pub fn run_name(&self) -> &str {
        &self.info.run_name
    }

    pub fn parent_run_id(&self) -> Option<&str> {
        self.info.parent_run_id.as_deref()
    }

    /// `runs:/{run_id}/{artifact_path}` URI for something logged to this run
    pub fn artifact_uri(&self, artifact_path: &str) -> String {
        format!("runs:/{}/{}", self.info.run_id, artifact_path.trim_matches('/'))
    }
}

/// Errors from experiment tracking operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("No active run")]
    NoActiveRun,

    #[error("Run {0} is already active; end it or start a nested run")]
    RunAlreadyActive(String),

    #[error("Run is not active: {0}")]
    RunNotActive(String),

    #[error("Storage error: {0}")]
    Storage(#[from] TrackingStorageError),
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Experiment tracker
///
/// Logging calls target the innermost active run.
#[derive(Debug)]
pub struct ExperimentTracker<B: TrackingBackend> {
    experiment_name: String,
    experiment_id: String,
    backend: B,
    active: Vec<RunInfo>,
}

impl<B: TrackingBackend> ExperimentTracker<B> {
    /// Bind to the named experiment, creating it if needed
    pub fn new(experiment_name: impl Into<String>, mut backend: B) -> Result<Self> {
        let experiment_name = experiment_name.into();
        let experiment_id = backend.get_or_create_experiment(&experiment_name)?;
        tracing::debug!(experiment = %experiment_name, id = %experiment_id, "experiment ready");
        Ok(Self {
            experiment_name,
            experiment_id,
            backend,
            active: Vec::new(),
        })
    }

    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Innermost active run
    #[must_use]
    pub fn active_run(&self) -> Option<&RunInfo> {
        self.active.last()
    }

    /// Number of open runs, outermost included
    #[must_use]
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Start a run
    ///
    /// A nested run takes the innermost active run as its parent. Starting a
    /// non-nested run while another is active is an error.
    pub fn start_run(&mut self, run_name: &str, nested: bool) -> Result<RunSession> {
        let parent = match (self.active.last(), nested) {
            (Some(active), false) => {
                return Err(TrackingError::RunAlreadyActive(active.run_id.clone()))
            }
            (Some(active), true) => Some(active.run_id.clone()),
            (None, _) => None,
        };

        let info = self
            .backend
            .create_run(&self.experiment_id, run_name, parent.as_deref())?;
        tracing::info!(
            run_id = %info.run_id,
            run_name,
            parent = parent.as_deref().unwrap_or("-"),
            "started run"
        );
        self.active.push(info.clone());
        Ok(RunSession { info })
    }

    /// End the innermost active run
    pub fn end_run(&mut self, status: RunStatus) -> Result<RunInfo> {
        let info = self.active.last().cloned().ok_or(TrackingError::NoActiveRun)?;
        self.backend.end_run(&info.run_id, status)?;
        self.active.pop();
        tracing::info!(run_id = %info.run_id, run_name = %info.run_name, ?status, "ended run");
        Ok(info)
    }

    /// End `session`, first ending any runs still open inside it
    pub fn close(&mut self, session: &RunSession, status: RunStatus) -> Result<()> {
        if !self.active.iter().any(|r| r.run_id == session.run_id()) {
            return Err(TrackingError::RunNotActive(session.run_id().to_string()));
        }
        while let Some(top) = self.active.last() {
            let is_session = top.run_id == session.run_id();
            if !is_session {
                tracing::warn!(run_id = %top.run_id, "ending run left open inside {}", session.run_name());
            }
            self.end_run(status)?;
            if is_session {
                break;
            }
        }
        Ok(())
    }

    /// End every run left active, returning how many were ended
    pub fn end_stray_runs(&mut self) -> Result<usize> {
        let mut ended = 0;
        while !self.active.is_empty() {
            self.end_run(RunStatus::Finished)?;
            ended += 1;
        }
        Ok(ended)
    }

    /// Run `f` inside a run that is always closed afterwards
    ///
    /// The run ends `FINISHED` when `f` returns `Ok` and `FAILED` when it
    /// returns `Err`; on the error path a failure to close is logged and the
    /// original error is returned.
    pub fn with_run<T, E, F>(&mut self, run_name: &str, nested: bool, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self, &RunSession) -> std::result::Result<T, E>,
        E: From<TrackingError>,
    {
        let session = self.start_run(run_name, nested)?;
        match f(self, &session) {
            Ok(value) => {
                self.close(&session, RunStatus::Finished)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(close_err) = self.close(&session, RunStatus::Failed) {
                    tracing::warn!(run_id = %session.run_id(), "failed to close run: {close_err}");
                }
                Err(err)
            }
        }
    }

    fn current_run_id(&self) -> Result<String> {
        self.active
            .last()
            .map(|r| r.run_id.clone())
            .ok_or(TrackingError::NoActiveRun)
    }

    /// Log parameters to the active run
    pub fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()> {
        let run_id = self.current_run_id()?;
        self.backend.log_params(&run_id, params)?;
        Ok(())
    }

    /// Log a single parameter to the active run
    pub fn log_param(&mut self, key: &str, value: &str) -> Result<()> {
        self.log_params(&BTreeMap::from([(key.to_string(), value.to_string())]))
    }

    /// Log metrics to the active run at step 0
    pub fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()> {
        let run_id = self.current_run_id()?;
        self.backend.log_metrics(&run_id, metrics, 0)?;
        Ok(())
    }

    /// Upload a local file to the active run, under `artifact_path` if given
    pub fn log_artifact(&mut self, local_path: &Path, artifact_path: Option<&str>) -> Result<String> {
        let run_id = self.current_run_id()?;
        let stored = self.backend.log_artifact(&run_id, local_path, artifact_path)?;
        tracing::info!(run_id = %run_id, artifact = %stored, "uploaded artifact");
        Ok(stored)
    }

    /// Register the model at `source` under `name`
    ///
    /// The owning run is taken from a `runs:/{run_id}/...` source, falling
    /// back to the active run.
    pub fn register_model(&mut self, source: &str, name: &str) -> Result<ModelVersion> {
        let run_id = match source_run_id(source) {
            Some(id) => id.to_string(),
            None => self.current_run_id()?,
        };
        let version = self.backend.register_model(source, name, &run_id)?;
        tracing::info!(model = %version.name, version = %version.version, %source, "registered model");
        Ok(version)
    }
}

/// Backend selected by the tracking configuration
pub fn open_backend(config: &TrackingConfig) -> Result<Box<dyn TrackingBackend>> {
    let backend: Box<dyn TrackingBackend> = match config.backend {
        BackendKind::Mlflow => {
            tracing::info!(uri = %config.uri, "tracking to MLflow server");
            Box::new(MlflowBackend::new(&config.uri)?)
        }
        BackendKind::Local => {
            tracing::info!(dir = %config.local_dir.display(), "tracking to local JSON files");
            Box::new(JsonFileBackend::new(&config.local_dir))
        }
    };
    Ok(backend)
}

/// Run id of a `runs:/{run_id}/...` URI
pub fn source_run_id(source: &str) -> Option<&str> {
    source
        .strip_prefix("runs:/")
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
}
