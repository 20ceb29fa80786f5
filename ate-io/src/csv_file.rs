//! CSV dataset reader.
//!
//! Comma-delimited with a header row. Every column is typed by looking at
//! all of its cells: numbers give a numeric column, `true`/`false` a boolean
//! column, anything else keeps the raw text as an object column.

use std::path::Path;

use tracing::debug;

use crate::dataset::{infer_dtype, Cell, Column, ColumnData, DType, Dataset};
use crate::traits::{DatasetReader, ReadError};

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader;

impl DatasetReader for CsvReader {
    fn format_name(&self) -> &'static str {
        "CSV"
    }

    fn read(&self, path: &Path) -> Result<Dataset, ReadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_path(path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(ReadError::Malformed("CSV file has no columns".into()));
        }

        let n_cols = headers.len();
        let mut raw: Vec<Vec<String>> = vec![Vec::new(); n_cols];
        for record in rdr.records() {
            let record = record?;
            for (j, field) in record.iter().enumerate() {
                raw[j].push(field.to_string());
            }
        }
        debug!("CSV: {} columns x {} rows", n_cols, raw[0].len());

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, values)| Column::new(name, column_from_text(values)))
            .collect();

        Ok(Dataset::new(columns)?)
    }
}

/// Type a column of raw text fields. Object columns keep the original text.
fn column_from_text(values: Vec<String>) -> ColumnData {
    let cells: Vec<Cell> = values.iter().map(|s| Cell::parse(s)).collect();
    if infer_dtype(&cells) == DType::Object {
        ColumnData::Object(
            cells
                .into_iter()
                .zip(values)
                .map(|(cell, raw)| (cell != Cell::Missing).then_some(raw))
                .collect(),
        )
    } else {
        ColumnData::from_cells(cells)
    }
}
