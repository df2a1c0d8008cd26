//! MLflow tracking server backend
//!
//! Talks to the MLflow REST API 2.0 over a blocking HTTP client. Artifacts
//! are uploaded through the artifact proxy
//! (`/api/2.0/mlflow-artifacts/artifacts/...`), so the server must run with
//! `--serve-artifacts` (the default since MLflow 2.0).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use super::storage::{artifact_relpath, now_ms, Result, TrackingBackend, TrackingStorageError};
use super::{ModelVersion, RunInfo, RunStatus};

const RESOURCE_ALREADY_EXISTS: &str = "RESOURCE_ALREADY_EXISTS";
const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

/// REST client for an MLflow tracking server
pub struct MlflowBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ExperimentEnvelope {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    run: RunPayload,
}

#[derive(Debug, Deserialize)]
struct RunPayload {
    info: RunPayloadInfo,
}

#[derive(Debug, Deserialize)]
struct RunPayloadInfo {
    run_id: String,
    experiment_id: String,
    #[serde(default)]
    artifact_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelVersionEnvelope {
    model_version: ModelVersionPayload,
}

#[derive(Debug, Deserialize)]
struct ModelVersionPayload {
    name: String,
    version: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    run_id: String,
}

impl MlflowBackend {
    /// Create a client for the server at `tracking_uri`
    pub fn new(tracking_uri: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("credit-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: tracking_uri.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/2.0/mlflow/{endpoint}", self.base_url)
    }

    fn artifact_url(&self, experiment_id: &str, run_id: &str, path: &str) -> String {
        format!(
            "{}/api/2.0/mlflow-artifacts/artifacts/{experiment_id}/{run_id}/artifacts/{path}",
            self.base_url
        )
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = self.api_url(endpoint);
        tracing::debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send()?;
        read_response(response)
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.api_url(endpoint);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).query(query).send()?;
        read_response(response)
    }

    fn run_experiment_id(&self, run_id: &str) -> Result<String> {
        let value = self.get("runs/get", &[("run_id", run_id)])?;
        let envelope: RunEnvelope = serde_json::from_value(value)?;
        Ok(envelope.run.info.experiment_id)
    }
}

impl std::fmt::Debug for MlflowBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlflowBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn read_response(response: reqwest::blocking::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text()?;
    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }

    let error: ApiError = serde_json::from_str(&text).unwrap_or(ApiError {
        error_code: String::new(),
        message: text,
    });
    Err(TrackingStorageError::Api {
        status: status.as_u16(),
        code: error.error_code,
        message: error.message,
    })
}

fn is_api_code(err: &TrackingStorageError, code: &str) -> bool {
    matches!(err, TrackingStorageError::Api { code: c, .. } if c == code)
}

fn status_name(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "RUNNING",
        RunStatus::Finished => "FINISHED",
        RunStatus::Failed => "FAILED",
        RunStatus::Killed => "KILLED",
    }
}

fn key_values<'a, V: serde::Serialize + 'a>(
    entries: impl IntoIterator<Item = (&'a String, V)>,
) -> Vec<Value> {
    entries
        .into_iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect()
}

impl TrackingBackend for MlflowBackend {
    fn get_or_create_experiment(&mut self, name: &str) -> Result<String> {
        match self.get("experiments/get-by-name", &[("experiment_name", name)]) {
            Ok(value) => {
                let envelope: ExperimentEnvelope = serde_json::from_value(value)?;
                Ok(envelope.experiment.experiment_id)
            }
            Err(err) if is_api_code(&err, RESOURCE_DOES_NOT_EXIST) => {
                let value = self.post("experiments/create", &json!({ "name": name }))?;
                let created: CreateExperimentResponse = serde_json::from_value(value)?;
                tracing::info!(experiment = name, id = %created.experiment_id, "created experiment");
                Ok(created.experiment_id)
            }
            Err(err) => Err(err),
        }
    }

    fn create_run(
        &mut self,
        experiment_id: &str,
        run_name: &str,
        parent_run_id: Option<&str>,
    ) -> Result<RunInfo> {
        let mut tags = vec![json!({ "key": "mlflow.runName", "value": run_name })];
        if let Some(parent) = parent_run_id {
            tags.push(json!({ "key": "mlflow.parentRunId", "value": parent }));
        }
        let body = json!({
            "experiment_id": experiment_id,
            "run_name": run_name,
            "start_time": now_ms(),
            "tags": tags,
        });
        let envelope: RunEnvelope = serde_json::from_value(self.post("runs/create", &body)?)?;
        let info = envelope.run.info;

        Ok(RunInfo {
            run_id: info.run_id,
            run_name: run_name.to_string(),
            experiment_id: info.experiment_id,
            parent_run_id: parent_run_id.map(String::from),
            artifact_uri: info.artifact_uri,
        })
    }

    fn log_params(&mut self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        if params.is_empty() {
            return Ok(());
        }
        let body = json!({ "run_id": run_id, "params": key_values(params) });
        self.post("runs/log-batch", &body)?;
        Ok(())
    }

    fn log_metrics(
        &mut self,
        run_id: &str,
        metrics: &BTreeMap<String, f64>,
        step: u64,
    ) -> Result<()> {
        if metrics.is_empty() {
            return Ok(());
        }
        let timestamp = now_ms();
        let metrics: Vec<Value> = metrics
            .iter()
            .map(|(key, value)| {
                json!({ "key": key, "value": value, "timestamp": timestamp, "step": step })
            })
            .collect();
        self.post("runs/log-batch", &json!({ "run_id": run_id, "metrics": metrics }))?;
        Ok(())
    }

    fn log_artifact(
        &mut self,
        run_id: &str,
        local_path: &Path,
        artifact_path: Option<&str>,
    ) -> Result<String> {
        if !local_path.is_file() {
            return Err(TrackingStorageError::ArtifactNotFound(local_path.to_path_buf()));
        }
        let content = fs::read(local_path)?;
        let path = artifact_relpath(local_path, artifact_path);
        let experiment_id = self.run_experiment_id(run_id)?;

        let url = self.artifact_url(&experiment_id, run_id, &path);
        tracing::debug!(%url, bytes = content.len(), "PUT");
        let response = self
            .client
            .put(&url)
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .send()?;
        read_response(response)?;
        Ok(path)
    }

    fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        let body = json!({
            "run_id": run_id,
            "status": status_name(status),
            "end_time": now_ms(),
        });
        self.post("runs/update", &body)?;
        Ok(())
    }

    fn register_model(&mut self, source: &str, name: &str, run_id: &str) -> Result<ModelVersion> {
        match self.post("registered-models/create", &json!({ "name": name })) {
            Ok(_) => tracing::info!(model = name, "registered new model"),
            Err(err) if is_api_code(&err, RESOURCE_ALREADY_EXISTS) => {}
            Err(err) => return Err(err),
        }

        let body = json!({ "name": name, "source": source, "run_id": run_id });
        let envelope: ModelVersionEnvelope =
            serde_json::from_value(self.post("model-versions/create", &body)?)?;
        let version = envelope.model_version;

        Ok(ModelVersion {
            name: version.name,
            version: version.version,
            source: if version.source.is_empty() { source.to_string() } else { version.source },
            run_id: if version.run_id.is_empty() { run_id.to_string() } else { version.run_id },
        })
    }
}
