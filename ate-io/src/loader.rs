//! Extension-dispatched dataset loading.
//!
//! `.csv`, `.pkl` and `.parquet` select a reader; anything else, and any
//! failure inside a reader, is an unsupported-format error. A path that does
//! not exist is reported separately. No fallback parsing is attempted.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::csv_file::CsvReader;
use crate::dataset::Dataset;
use crate::parquet_file::ParquetReader;
use crate::pickle_file::PickleReader;
use crate::traits::{DatasetReader, ReadError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file format for '{}'", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("could not read '{}' as {format}", .path.display())]
    Unreadable {
        path: PathBuf,
        format: DataFormat,
        #[source]
        source: ReadError,
    },
}

impl LoadError {
    /// The one-line message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::NotFound(path) => format!("Error: File '{}' not found.", path.display()),
            LoadError::UnsupportedFormat { .. } | LoadError::Unreadable { .. } => {
                "Error: Not supported file format.".to_string()
            }
        }
    }
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Pickle,
    Parquet,
}

impl DataFormat {
    /// Pick a format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(DataFormat::Csv),
            "pkl" => Some(DataFormat::Pickle),
            "parquet" => Some(DataFormat::Parquet),
            _ => None,
        }
    }

    pub fn reader(self) -> Box<dyn DatasetReader> {
        match self {
            DataFormat::Csv => Box::new(CsvReader::default()),
            DataFormat::Pickle => Box::new(PickleReader),
            DataFormat::Parquet => Box::new(ParquetReader),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reader().format_name())
    }
}

/// Load a dataset, choosing the reader from the file extension.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let format = DataFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let reader = format.reader();
    debug!("Reading {} with the {} reader", path.display(), reader.format_name());
    let dataset = reader.read(path).map_err(|source| LoadError::Unreadable {
        path: path.to_path_buf(),
        format,
        source,
    })?;

    info!(
        "Loaded {} rows x {} columns from {}",
        dataset.n_rows(),
        dataset.n_cols(),
        path.display()
    );
    Ok(dataset)
}
