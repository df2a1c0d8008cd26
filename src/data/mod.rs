//! Dataset loading and snapshots
//!
//! A [`DatasetSnapshot`] is an immutable view of a `polars` [`DataFrame`] at
//! one stage of the pipeline (raw, cleaned, training-ready). The ledger only
//! ever reads its schema.


use std::fs::File;
use std::path::Path;

use ndarray::Array2;
use polars::prelude::*;
use thiserror::Error;

/// Errors from dataset loading and conversion
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("column {column} contains {nulls} null value(s)")]
    NullValues { column: String, nulls: usize },

    #[error("dataset {0} has no rows")]
    Empty(String),
}

/// Result alias for data operations
pub type Result<T> = std::result::Result<T, DataError>;

/// One named column and its declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: String,
}

/// Immutable, point-in-time view of a tabular dataset
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    frame: DataFrame,
}

impl DatasetSnapshot {
    /// Wrap an in-memory frame
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Read a CSV file with a header row, inferring column types
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()?;

        tracing::info!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            "loaded dataset"
        );
        Ok(Self { frame })
    }

    /// Underlying frame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the snapshot and return the frame
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.frame.width()
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.frame.height()
    }

    /// Column names paired with their declared type strings, in frame order
    pub fn schema(&self) -> Vec<ColumnSchema> {
        self.frame
            .get_columns()
            .iter()
            .map(|series| ColumnSchema {
                name: series.name().to_string(),
                dtype: dtype_name(series.dtype()),
            })
            .collect()
    }
}

impl From<DataFrame> for DatasetSnapshot {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

/// Canonical type string recorded for a column
pub fn dtype_name(dtype: &DataType) -> String {
    let name = match dtype {
        DataType::Boolean => "bool",
        DataType::Int8 => "int8",
        DataType::Int16 => "int16",
        DataType::Int32 => "int32",
        DataType::Int64 => "int64",
        DataType::UInt8 => "uint8",
        DataType::UInt16 => "uint16",
        DataType::UInt32 => "uint32",
        DataType::UInt64 => "uint64",
        DataType::Float32 => "float32",
        DataType::Float64 => "float64",
        DataType::String => "string",
        DataType::Date => "date",
        DataType::Datetime(_, _) => "datetime",
        DataType::Duration(_) => "duration",
        DataType::Null => "null",
        other => return other.to_string(),
    };
    name.to_string()
}

/// Read a column as `f64` values, failing on nulls
pub fn column_as_f64(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = frame.column(name)?.cast(&DataType::Float64)?;
    let nulls = series.null_count();
    if nulls > 0 {
        return Err(DataError::NullValues {
            column: name.to_string(),
            nulls,
        });
    }
    Ok(series.f64()?.into_no_null_iter().collect())
}

/// Load a headed CSV of numeric columns into a row-major matrix
///
/// Used for label and prediction score files, one column per class.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let snapshot = DatasetSnapshot::from_csv(path)?;
    let frame = snapshot.frame();
    if frame.height() == 0 {
        return Err(DataError::Empty(path.display().to_string()));
    }

    let columns = frame
        .get_column_names()
        .into_iter()
        .map(|name| column_as_f64(frame, name))
        .collect::<Result<Vec<_>>>()?;

    let rows = frame.height();
    let cols = columns.len();
    Ok(Array2::from_shape_fn((rows, cols), |(r, c)| columns[c][r]))
}
