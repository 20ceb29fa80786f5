//! Pickle dataset reader.
//!
//! Accepts a pickled column mapping, as written by
//! `pickle.dump(df.to_dict("list"))` (column name -> list of cells) or
//! `pickle.dump(df.to_dict("records"))` (list of row dicts). Cells may be
//! `None`, bool, int, float or str. Columns come out in sorted name order.
//! Arbitrary object graphs such as a pickled `DataFrame` are rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use serde_pickle::DeOptions;
use tracing::debug;

use crate::dataset::{Cell, Column, ColumnData, Dataset};
use crate::traits::{DatasetReader, ReadError};

#[derive(Debug, Clone, Copy, Default)]
pub struct PickleReader;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PickleCell {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<PickleCell> for Cell {
    fn from(cell: PickleCell) -> Self {
        match cell {
            PickleCell::Missing => Cell::Missing,
            PickleCell::Bool(b) => Cell::Bool(b),
            PickleCell::Int(i) => Cell::Number(i as f64),
            PickleCell::Float(f) if f.is_nan() => Cell::Missing,
            PickleCell::Float(f) => Cell::Number(f),
            PickleCell::Text(s) => Cell::Text(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PickleTable {
    Columns(BTreeMap<String, Vec<PickleCell>>),
    Records(Vec<BTreeMap<String, PickleCell>>),
}

impl DatasetReader for PickleReader {
    fn format_name(&self) -> &'static str {
        "pickle"
    }

    fn read(&self, path: &Path) -> Result<Dataset, ReadError> {
        let bytes = std::fs::read(path)?;
        let table: PickleTable = serde_pickle::from_slice(&bytes, DeOptions::new())?;

        let columns = match table {
            PickleTable::Columns(map) => {
                debug!("pickle: column mapping with {} columns", map.len());
                map.into_iter()
                    .map(|(name, cells)| {
                        let cells = cells.into_iter().map(Cell::from).collect();
                        Column::new(name, ColumnData::from_cells(cells))
                    })
                    .collect()
            }
            PickleTable::Records(rows) => {
                debug!("pickle: {} records", rows.len());
                records_to_columns(rows)
            }
        };

        Ok(Dataset::new(columns)?)
    }
}

/// Pivot row dicts into columns; keys absent from a row are missing.
fn records_to_columns(rows: Vec<BTreeMap<String, PickleCell>>) -> Vec<Column> {
    let names: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
    let mut cells: BTreeMap<String, Vec<Cell>> = names
        .into_iter()
        .map(|name| (name, Vec::with_capacity(rows.len())))
        .collect();

    for mut row in rows {
        for (name, column) in cells.iter_mut() {
            column.push(row.remove(name).map_or(Cell::Missing, Cell::from));
        }
    }

    cells
        .into_iter()
        .map(|(name, column)| Column::new(name, ColumnData::from_cells(column)))
        .collect()
}
