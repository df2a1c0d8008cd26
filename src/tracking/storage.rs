//! Tracking storage backends
//!
//! Provides the `TrackingBackend` trait plus a JSON file-based and an
//! in-memory implementation. The MLflow REST backend lives in
//! [`super::mlflow`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ModelVersion, RunInfo, RunStatus};

/// Errors from tracking storage operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracking server returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Artifact source not found: {0}")]
    ArtifactNotFound(PathBuf),
}

/// Result alias for tracking storage operations
pub type Result<T> = std::result::Result<T, TrackingStorageError>;

/// Milliseconds since the Unix epoch
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Serializable snapshot of a run for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub run_name: String,
    pub experiment_id: String,
    pub parent_run_id: Option<String>,
    pub status: RunStatus,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, Vec<MetricEntry>>,
    pub artifacts: Vec<ArtifactRecord>,
    pub start_time_ms: u64,
    pub end_time_ms: Option<u64>,
}

impl RunRecord {
    fn new(info: &RunInfo) -> Self {
        Self {
            run_id: info.run_id.clone(),
            run_name: info.run_name.clone(),
            experiment_id: info.experiment_id.clone(),
            parent_run_id: info.parent_run_id.clone(),
            status: RunStatus::Running,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            artifacts: Vec::new(),
            start_time_ms: now_ms(),
            end_time_ms: None,
        }
    }

    /// Latest value logged for a metric
    pub fn latest_metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(|v| v.last()).map(|e| e.value)
    }

    /// Artifact stored under `path` (relative to the run's artifact root)
    pub fn artifact(&self, path: &str) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}

/// A single metric data point for serialization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEntry {
    pub value: f64,
    pub step: u64,
    pub timestamp_ms: u64,
}

/// An uploaded artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// Path relative to the run's artifact root
    pub path: String,
    /// Local file the artifact was read from
    pub source: PathBuf,
    pub sha256: String,
    pub size_bytes: u64,
}

impl ArtifactRecord {
    fn read(local_path: &Path, artifact_path: Option<&str>) -> Result<(Self, Vec<u8>)> {
        if !local_path.is_file() {
            return Err(TrackingStorageError::ArtifactNotFound(local_path.to_path_buf()));
        }
        let bytes = fs::read(local_path)?;
        let record = Self {
            path: artifact_relpath(local_path, artifact_path),
            source: local_path.to_path_buf(),
            sha256: hex::encode(Sha256::digest(&bytes)),
            size_bytes: bytes.len() as u64,
        };
        Ok((record, bytes))
    }
}

/// Artifact location of `local_path` under an optional sub-directory
pub fn artifact_relpath(local_path: &Path, artifact_path: Option<&str>) -> String {
    let file_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match artifact_path.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(dir) => format!("{dir}/{file_name}"),
        None => file_name,
    }
}

/// Trait for tracking storage backends
///
/// Implementations talk to a tracking server (or stand in for one). The
/// active-run stack lives in [`super::ExperimentTracker`], not here.
pub trait TrackingBackend {
    /// Look up an experiment by name, creating it when absent; returns its id
    fn get_or_create_experiment(&mut self, name: &str) -> Result<String>;

    /// Create a run, nested under `parent_run_id` when given
    fn create_run(
        &mut self,
        experiment_id: &str,
        run_name: &str,
        parent_run_id: Option<&str>,
    ) -> Result<RunInfo>;

    fn log_params(&mut self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()>;

    fn log_metrics(&mut self, run_id: &str, metrics: &BTreeMap<String, f64>, step: u64)
        -> Result<()>;

    /// Upload a local file; returns its path relative to the run's artifact root
    fn log_artifact(
        &mut self,
        run_id: &str,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> Result<String>;

    /// Mark a run terminated with `status`
    fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()>;

    /// Register the model at `source` (a `runs:/` URI) under `name`
    fn register_model(&mut self, source: &str, name: &str, run_id: &str) -> Result<ModelVersion>;
}

impl<T: TrackingBackend + ?Sized> TrackingBackend for Box<T> {
    fn get_or_create_experiment(&mut self, name: &str) -> Result<String> {
        (**self).get_or_create_experiment(name)
    }

    fn create_run(
        &mut self,
        experiment_id: &str,
        run_name: &str,
        parent_run_id: Option<&str>,
    ) -> Result<RunInfo> {
        (**self).create_run(experiment_id, run_name, parent_run_id)
    }

    fn log_params(&mut self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        (**self).log_params(run_id, params)
    }

    fn log_metrics(
        &mut self,
        run_id: &str,
        metrics: &BTreeMap<String, f64>,
        step: u64,
    ) -> Result<()> {
        (**self).log_metrics(run_id, metrics, step)
    }

    fn log_artifact(
        &mut self,
        run_id: &str,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> Result<String> {
        (**self).log_artifact(run_id, local_path, artifact_path)
    }

    fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        (**self).end_run(run_id, status)
    }

    fn register_model(&mut self, source: &str, name: &str, run_id: &str) -> Result<ModelVersion> {
        (**self).register_model(source, name, run_id)
    }
}

fn log_params_into(run: &mut RunRecord, params: &BTreeMap<String, String>) {
    for (k, v) in params {
        run.params.insert(k.clone(), v.clone());
    }
}

fn log_metrics_into(run: &mut RunRecord, metrics: &BTreeMap<String, f64>, step: u64) {
    let timestamp_ms = now_ms();
    for (k, v) in metrics {
        run.metrics.entry(k.clone()).or_default().push(MetricEntry {
            value: *v,
            step,
            timestamp_ms,
        });
    }
}

fn finish(run: &mut RunRecord, status: RunStatus) {
    run.status = status;
    run.end_time_ms = Some(now_ms());
}

fn next_version(versions: &[ModelVersion], name: &str) -> u64 {
    versions.iter().filter(|v| v.name == name).count() as u64 + 1
}

/// JSON file-based tracking backend
///
/// Stores each run as `{run_id}.json` under `dir`, copies artifacts to
/// `{run_id}/artifacts/` and keeps model versions in `registry.json`.
///
/// # Example
///
/// ```no_run
/// use credit_pipeline::tracking::storage::{JsonFileBackend, TrackingBackend};
///
/// let mut backend = JsonFileBackend::new("mlruns");
/// let experiment_id = backend.get_or_create_experiment("credit").unwrap();
/// ```
#[derive(Debug)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

/// Experiments and registered model versions of a [`JsonFileBackend`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    experiments: BTreeMap<String, String>,
    model_versions: Vec<ModelVersion>,
}

impl JsonFileBackend {
    /// Create a new JSON file backend; the directory is created on first write
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }

    fn registry_path(&self) -> PathBuf {
        self.dir.join("registry.json")
    }

    /// Directory holding a run's uploaded artifacts
    pub fn artifact_root(&self, run_id: &str) -> PathBuf {
        self.dir.join(run_id).join("artifacts")
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    fn load_registry(&self) -> Result<Registry> {
        let path = self.registry_path();
        if !path.exists() {
            return Ok(Registry::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn save_registry(&self, registry: &Registry) -> Result<()> {
        self.ensure_dir()?;
        fs::write(self.registry_path(), serde_json::to_string_pretty(registry)?)?;
        Ok(())
    }

    fn save_run(&self, run: &RunRecord) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(run)?;
        fs::write(self.run_path(&run.run_id), json)?;
        Ok(())
    }

    fn update_run(&self, run_id: &str, f: impl FnOnce(&mut RunRecord)) -> Result<()> {
        let mut run = self.load_run(run_id)?;
        f(&mut run);
        self.save_run(&run)
    }

    /// Load a run by its ID
    pub fn load_run(&self, run_id: &str) -> Result<RunRecord> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Err(TrackingStorageError::RunNotFound(run_id.to_string()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// List all stored runs, ordered by start time
    pub fn list_runs(&self) -> Result<Vec<RunRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let registry = self.registry_path();
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == registry {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let json = fs::read_to_string(&path)?;
                runs.push(serde_json::from_str::<RunRecord>(&json)?);
            }
        }
        runs.sort_by(|a, b| {
            (a.start_time_ms, &a.run_id).cmp(&(b.start_time_ms, &b.run_id))
        });
        Ok(runs)
    }

    /// Registered versions of every model
    pub fn model_versions(&self) -> Result<Vec<ModelVersion>> {
        Ok(self.load_registry()?.model_versions)
    }
}

impl TrackingBackend for JsonFileBackend {
    fn get_or_create_experiment(&mut self, name: &str) -> Result<String> {
        let mut registry = self.load_registry()?;
        if let Some(id) = registry.experiments.get(name) {
            return Ok(id.clone());
        }
        let id = registry.experiments.len().to_string();
        registry.experiments.insert(name.to_string(), id.clone());
        self.save_registry(&registry)?;
        Ok(id)
    }

    fn create_run(
        &mut self,
        experiment_id: &str,
        run_name: &str,
        parent_run_id: Option<&str>,
    ) -> Result<RunInfo> {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let info = RunInfo {
            artifact_uri: Some(self.artifact_root(&run_id).display().to_string()),
            run_id,
            run_name: run_name.to_string(),
            experiment_id: experiment_id.to_string(),
            parent_run_id: parent_run_id.map(String::from),
        };
        self.save_run(&RunRecord::new(&info))?;
        Ok(info)
    }

    fn log_params(&mut self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        self.update_run(run_id, |run| log_params_into(run, params))
    }

    fn log_metrics(
        &mut self,
        run_id: &str,
        metrics: &BTreeMap<String, f64>,
        step: u64,
    ) -> Result<()> {
        self.update_run(run_id, |run| log_metrics_into(run, metrics, step))
    }

    fn log_artifact(
        &mut self,
        run_id: &str,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> Result<String> {
        let mut run = self.load_run(run_id)?;
        let (record, bytes) = ArtifactRecord::read(local_path, artifact_path)?;

        let dest = self.artifact_root(run_id).join(&record.path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, bytes)?;

        let path = record.path.clone();
        run.artifacts.retain(|a| a.path != path);
        run.artifacts.push(record);
        self.save_run(&run)?;
        Ok(path)
    }

    fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        self.update_run(run_id, |run| finish(run, status))
    }

    fn register_model(&mut self, source: &str, name: &str, run_id: &str) -> Result<ModelVersion> {
        let mut registry = self.load_registry()?;
        let version = ModelVersion {
            name: name.to_string(),
            version: next_version(&registry.model_versions, name).to_string(),
            source: source.to_string(),
            run_id: run_id.to_string(),
        };
        registry.model_versions.push(version.clone());
        self.save_registry(&registry)?;
        Ok(version)
    }
}

/// In-memory tracking backend for testing
///
/// Run ids are sequential (`run-1`, `run-2`, ...). Artifacts are hashed
/// but their bytes are not kept.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    experiments: BTreeMap<String, String>,
    runs: Vec<RunRecord>,
    model_versions: Vec<ModelVersion>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Experiment id for `name`, if it was ever created
    pub fn experiment_id(&self, name: &str) -> Option<&str> {
        self.experiments.get(name).map(String::as_str)
    }

    /// Load a run by its ID
    pub fn load_run(&self, run_id: &str) -> Result<RunRecord> {
        self.runs
            .iter()
            .find(|r| r.run_id == run_id)
            .cloned()
            .ok_or_else(|| TrackingStorageError::RunNotFound(run_id.to_string()))
    }

    /// First run created with `run_name`
    pub fn find_run(&self, run_name: &str) -> Option<&RunRecord> {
        self.runs.iter().find(|r| r.run_name == run_name)
    }

    /// All runs in creation order
    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    pub fn model_versions(&self) -> &[ModelVersion] {
        &self.model_versions
    }

    fn run_mut(&mut self, run_id: &str) -> Result<&mut RunRecord> {
        self.runs
            .iter_mut()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| TrackingStorageError::RunNotFound(run_id.to_string()))
    }
}

impl TrackingBackend for InMemoryBackend {
    fn get_or_create_experiment(&mut self, name: &str) -> Result<String> {
        let next_id = self.experiments.len().to_string();
        Ok(self
            .experiments
            .entry(name.to_string())
            .or_insert(next_id)
            .clone())
    }

    fn create_run(
        &mut self,
        experiment_id: &str,
        run_name: &str,
        parent_run_id: Option<&str>,
    ) -> Result<RunInfo> {
        let info = RunInfo {
            run_id: format!("run-{}", self.runs.len() + 1),
            run_name: run_name.to_string(),
            experiment_id: experiment_id.to_string(),
            parent_run_id: parent_run_id.map(String::from),
            artifact_uri: None,
        };
        self.runs.push(RunRecord::new(&info));
        Ok(info)
    }

    fn log_params(&mut self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        log_params_into(self.run_mut(run_id)?, params);
        Ok(())
    }

    fn log_metrics(
        &mut self,
        run_id: &str,
        metrics: &BTreeMap<String, f64>,
        step: u64,
    ) -> Result<()> {
        log_metrics_into(self.run_mut(run_id)?, metrics, step);
        Ok(())
    }

    fn log_artifact(
        &mut self,
        run_id: &str,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> Result<String> {
        let (record, _) = ArtifactRecord::read(local_path, artifact_path)?;
        let run = self.run_mut(run_id)?;
        let path = record.path.clone();
        run.artifacts.retain(|a| a.path != path);
        run.artifacts.push(record);
        Ok(path)
    }

    fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        finish(self.run_mut(run_id)?, status);
        Ok(())
    }

    fn register_model(&mut self, source: &str, name: &str, run_id: &str) -> Result<ModelVersion> {
        let version = ModelVersion {
            name: name.to_string(),
            version: next_version(&self.model_versions, name).to_string(),
            source: source.to_string(),
            run_id: run_id.to_string(),
        };
        self.model_versions.push(version.clone());
        Ok(version)
    }
}
