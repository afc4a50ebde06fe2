use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to scan parquet file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: String },
}
