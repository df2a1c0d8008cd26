use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;

use super::{CleanedData, DataCleaner, PrepError, Result};

/// Drops every row holding a null and writes the result as CSV
#[derive(Debug, Clone)]
pub struct DropNullsCleaner {
    output: PathBuf,
}

impl DropNullsCleaner {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn write(&self, frame: &mut DataFrame) -> Result<()> {
        let io_err = |source| PrepError::Io {
            path: self.output.clone(),
            source,
        };
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = File::create(&self.output).map_err(io_err)?;
        CsvWriter::new(&mut file).finish(frame)?;
        Ok(())
    }
}

impl DataCleaner for DropNullsCleaner {
    fn clean(&self, frame: &DataFrame) -> Result<CleanedData> {
        let mut cleaned = frame.drop_nulls::<String>(None)?;
        let dropped = frame.height() - cleaned.height();
        self.write(&mut cleaned)?;

        tracing::info!(
            rows = cleaned.height(),
            dropped,
            path = %self.output.display(),
            "cleaned dataset written"
        );
        Ok(CleanedData {
            frame: cleaned,
            path: self.output.clone(),
        })
    }
}
