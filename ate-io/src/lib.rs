//! ate-io: Dataset I/O for ate-rs
//!
//! Provides the in-memory [`Dataset`] model, a [`DatasetReader`] trait and
//! implementations for CSV, Parquet and pickle files, and the
//! extension-dispatching [`load_dataset`] entry point.

pub mod csv_file;
pub mod dataset;
pub mod loader;
pub mod parquet_file;
pub mod pickle_file;
pub mod traits;

pub use dataset::{Categorical, Column, ColumnData, DType, Dataset, DatasetError};
pub use loader::{load_dataset, DataFormat, LoadError};
pub use traits::{DatasetReader, ReadError};
