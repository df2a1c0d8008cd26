//! Feature ledger
//!
//! Records, per named dataset snapshot, the columns and their declared types
//! in a YAML sidecar document (`features.yaml` by default). Each
//! [`FeatureLedger::record`] is a read-modify-write merge: the existing
//! document is loaded, the snapshot's key is overwritten, and the document is
//! written back. Keys are only ever removed by [`FeatureLedger::purge`].
//!
//! There is no locking; two writers racing on the same file lose updates.
//!
//! # Example
//!
//! ```no_run
//! use credit_pipeline::data::DatasetSnapshot;
//! use credit_pipeline::ledger::FeatureLedger;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = FeatureLedger::new("features.yaml");
//! let raw = DatasetSnapshot::from_csv("data/train.csv")?;
//! ledger.record(&raw, "Initial Features", "")?;
//!
//! let document = ledger.load()?;
//! assert!(document.contains("Initial Features"));
//! # Ok(())
//! # }
//! ```


use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DatasetSnapshot;

/// Default sidecar file name
pub const DEFAULT_LEDGER_FILE: &str = "features.yaml";

/// Snapshot name for the raw input dataset
pub const INITIAL_FEATURES: &str = "Initial Features";
/// Snapshot name for the cleaned dataset
pub const CLEANED_FEATURES: &str = "Cleaned Features";
/// Snapshot name for the final training features
pub const TRAINING_FEATURES: &str = "Training Features";

/// Errors from ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Feature description of one dataset snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub dataset_name: String,
    pub description: String,
    /// Column name -> declared type
    pub features: BTreeMap<String, String>,
    pub num_features: usize,
}

impl LedgerEntry {
    /// Describe a snapshot's columns under the given name
    pub fn from_snapshot(
        snapshot: &DatasetSnapshot,
        dataset_name: &str,
        description: &str,
    ) -> Self {
        let features = snapshot
            .schema()
            .into_iter()
            .map(|column| (column.name, column.dtype))
            .collect();

        Self {
            dataset_name: dataset_name.to_string(),
            description: description.to_string(),
            features,
            num_features: snapshot.num_columns(),
        }
    }
}

/// The whole sidecar document: snapshot name -> entry
///
/// Entries are kept as raw YAML values so that foreign or hand-edited keys
/// survive a merge untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerDocument {
    entries: BTreeMap<String, serde_yaml::Value>,
}

impl LedgerDocument {
    /// Empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshot keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a snapshot key is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Snapshot keys in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Typed entry for a key, if present and well-formed
    pub fn entry(&self, name: &str) -> Option<LedgerEntry> {
        self.entries
            .get(name)
            .and_then(|value| serde_yaml::from_value(value.clone()).ok())
    }

    /// Raw YAML value for a key
    pub fn raw(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.entries.get(name)
    }

    /// Overwrite the entry under its dataset name
    pub fn upsert(&mut self, entry: &LedgerEntry) -> Result<()> {
        let value = serde_yaml::to_value(entry)?;
        self.entries.insert(entry.dataset_name.clone(), value);
        Ok(())
    }

    /// Render as block-style YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Outcome of [`FeatureLedger::purge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// The document existed and was removed
    Deleted,
    /// There was nothing to remove
    Absent,
}

/// File-backed ledger store owning its document path
#[derive(Debug, Clone)]
pub struct FeatureLedger {
    path: PathBuf,
}

impl Default for FeatureLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_FILE)
    }
}

impl FeatureLedger {
    /// Ledger backed by the given document path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the sidecar document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the document currently exists on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Record a snapshot's columns under `snapshot_name`, merging into the
    /// existing document
    pub fn record(
        &self,
        snapshot: &DatasetSnapshot,
        snapshot_name: &str,
        description: &str,
    ) -> Result<LedgerEntry> {
        let entry = LedgerEntry::from_snapshot(snapshot, snapshot_name, description);

        let mut document = self.load()?;
        document.upsert(&entry)?;
        self.save(&document)?;

        tracing::info!(
            "Feature information for {} saved to {}",
            snapshot_name,
            self.path.display()
        );
        Ok(entry)
    }

    /// Load the document, substituting an empty one when the file is missing,
    /// empty, or unparsable
    pub fn load(&self) -> Result<LedgerDocument> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LedgerDocument::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        if contents.trim().is_empty() {
            return Ok(LedgerDocument::new());
        }

        match serde_yaml::from_str::<LedgerDocument>(&contents) {
            Ok(document) => Ok(document),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ledger document is malformed, starting from an empty document"
                );
                Ok(LedgerDocument::new())
            }
        }
    }

    /// Write the document, replacing the file
    pub fn save(&self, document: &LedgerDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let yaml = document.to_yaml()?;
        fs::write(&self.path, yaml).map_err(|e| self.io_error(e))
    }

    /// Delete the document if present
    pub fn purge(&self) -> Result<PurgeOutcome> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("{} has been deleted.", self.path.display());
                Ok(PurgeOutcome::Deleted)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("{} does not exist.", self.path.display());
                Ok(PurgeOutcome::Absent)
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
