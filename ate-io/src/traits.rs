//! Core traits for dataset reading.

use std::path::Path;

use thiserror::Error;

use crate::dataset::{Dataset, DatasetError};

/// Failure inside a format reader. Any of these means the file content
/// could not be turned into a [`Dataset`].
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("Invalid table: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Malformed input: {0}")]
    Malformed(String),
}

/// Trait for reading a tabular dataset from one file format.
///
/// Each supported format (CSV, Parquet, pickle) implements this trait;
/// the loader picks an implementation from the file extension and calls
/// it through `Box<dyn DatasetReader>`.
pub trait DatasetReader {
    /// Short human-readable name of the format, used in logs.
    fn format_name(&self) -> &'static str;

    /// Read the whole file into memory.
    fn read(&self, path: &Path) -> Result<Dataset, ReadError>;
}
