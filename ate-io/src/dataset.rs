//! In-memory tabular dataset.
//!
//! A [`Dataset`] is an ordered set of equally long, named columns. Each
//! column has a single storage type ([`DType`]); the only in-place mutation
//! supported is retyping a text column as categorical.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("column '{0}' not found in dataset")]
    ColumnNotFound(String),

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{name}' has {got} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Storage type of a column, named after the equivalent pandas dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Numeric,
    Boolean,
    Object,
    Category,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Numeric => "float64",
            DType::Boolean => "bool",
            DType::Object => "object",
            DType::Category => "category",
        };
        f.write_str(name)
    }
}

/// Categorical column: sorted level labels plus one code per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    levels: Vec<String>,
    codes: Vec<Option<u32>>,
}

impl Categorical {
    /// Build a categorical from optional labels. Levels are the sorted
    /// distinct non-missing labels.
    pub fn from_labels<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let values: Vec<Option<S>> = values.into_iter().collect();
        let levels: Vec<String> = values
            .iter()
            .flatten()
            .map(|s| AsRef::<str>::as_ref(s).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes = values
            .iter()
            .map(|v| {
                v.as_ref().map(|s| {
                    let label: &str = s.as_ref();
                    // levels is sorted and contains every label
                    levels.binary_search_by(|l| l.as_str().cmp(label)).unwrap_or(0) as u32
                })
            })
            .collect();
        Self { levels, codes }
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn codes(&self) -> &[Option<u32>] {
        &self.codes
    }

    /// Label at row `i`, or `None` if missing.
    pub fn label(&self, i: usize) -> Option<&str> {
        self.codes[i].map(|c| self.levels[c as usize].as_str())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Column storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Floating point values, `NaN` marks missing.
    Numeric(Vec<f64>),
    Boolean(Vec<Option<bool>>),
    /// Free text ("object" columns).
    Object(Vec<Option<String>>),
    Category(Categorical),
}

impl ColumnData {
    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Numeric(_) => DType::Numeric,
            ColumnData::Boolean(_) => DType::Boolean,
            ColumnData::Object(_) => DType::Object,
            ColumnData::Category(_) => DType::Category,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Object(v) => v.len(),
            ColumnData::Category(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[i].is_nan(),
            ColumnData::Boolean(v) => v[i].is_none(),
            ColumnData::Object(v) => v[i].is_none(),
            ColumnData::Category(c) => c.codes()[i].is_none(),
        }
    }

    /// Build a column from loosely typed cells.
    ///
    /// Only numbers (or missing) gives `Numeric`, only booleans (or missing)
    /// gives `Boolean`; any text or a mix of kinds gives `Object`. A column
    /// with no present values is `Numeric`.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        match infer_dtype(&cells) {
            DType::Numeric => ColumnData::Numeric(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Number(v) => v,
                        _ => f64::NAN,
                    })
                    .collect(),
            ),
            DType::Boolean => ColumnData::Boolean(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => ColumnData::Object(cells.into_iter().map(Cell::into_text).collect()),
        }
    }
}

/// A single loosely typed value, as produced by text or pickle readers.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Strings read as missing values.
pub const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

impl Cell {
    /// Classify a raw text field.
    pub fn parse(raw: &str) -> Cell {
        let s = raw.trim();
        if NA_VALUES.contains(&s) {
            return Cell::Missing;
        }
        if let Ok(v) = s.parse::<f64>() {
            return Cell::Number(v);
        }
        if s.eq_ignore_ascii_case("true") {
            Cell::Bool(true)
        } else if s.eq_ignore_ascii_case("false") {
            Cell::Bool(false)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Bool(true) => Some("True".to_string()),
            Cell::Bool(false) => Some("False".to_string()),
            Cell::Number(v) if v.is_nan() => None,
            Cell::Number(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s),
        }
    }
}

/// Storage type a sequence of cells would be stored as.
pub fn infer_dtype(cells: &[Cell]) -> DType {
    let mut has_bool = false;
    let mut has_number = false;
    for cell in cells {
        match cell {
            Cell::Missing => {}
            Cell::Bool(_) => has_bool = true,
            Cell::Number(_) => has_number = true,
            Cell::Text(_) => return DType::Object,
        }
    }
    match (has_bool, has_number) {
        (true, true) => DType::Object,
        (true, false) => DType::Boolean,
        _ => DType::Numeric,
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }
}

/// A table of named, equally long columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let n_rows = columns.first().map_or(0, |c| c.data.len());
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(col.name.clone()));
            }
            if col.data.len() != n_rows {
                return Err(DatasetError::LengthMismatch {
                    name: col.name.clone(),
                    expected: n_rows,
                    got: col.data.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DatasetError::ColumnNotFound(name.to_string()))
    }

    pub fn dtype(&self, name: &str) -> Result<DType, DatasetError> {
        self.column(name).map(Column::dtype)
    }

    /// Retype an object column as categorical in place.
    ///
    /// Returns `true` if the column was converted, `false` if it was left
    /// alone because it is not an object column.
    pub fn to_categorical(&mut self, name: &str) -> Result<bool, DatasetError> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| DatasetError::ColumnNotFound(name.to_string()))?;
        let converted = match &col.data {
            ColumnData::Object(values) => {
                ColumnData::Category(Categorical::from_labels(values.iter().map(|v| v.as_deref())))
            }
            _ => return Ok(false),
        };
        col.data = converted;
        Ok(true)
    }
}
