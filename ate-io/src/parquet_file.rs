//! Parquet dataset reader.
//!
//! Uses the `parquet` crate's Arrow reader and maps Arrow types onto
//! dataset storage types: integers and floats become numeric, `Boolean`
//! stays boolean, strings become object columns and string dictionaries
//! (how pandas writes `category` columns) become categoricals. Columns of
//! any other Arrow type are skipped.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, warn};

use crate::dataset::{Categorical, Column, ColumnData, DType, Dataset};
use crate::traits::{DatasetReader, ReadError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetReader;

impl DatasetReader for ParquetReader {
    fn format_name(&self) -> &'static str {
        "Parquet"
    }

    fn read(&self, path: &Path) -> Result<Dataset, ReadError> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;
        let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>()?;
        debug!("Parquet: {} fields, {} record batches", schema.fields().len(), batches.len());

        let mut columns = Vec::with_capacity(schema.fields().len());
        for (j, field) in schema.fields().iter().enumerate() {
            let Some(dtype) = storage_type(field.data_type()) else {
                warn!(
                    "Skipping column '{}' with unsupported Arrow type {}",
                    field.name(),
                    field.data_type()
                );
                continue;
            };
            let arrays: Vec<&ArrayRef> = batches.iter().map(|b| b.column(j)).collect();
            columns.push(Column::new(field.name().clone(), read_column(&arrays, dtype)?));
        }

        Ok(Dataset::new(columns)?)
    }
}

/// Storage type for an Arrow type, or `None` if unsupported.
fn storage_type(data_type: &DataType) -> Option<DType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64 => Some(DType::Numeric),
        DataType::Boolean => Some(DType::Boolean),
        DataType::Utf8 | DataType::LargeUtf8 => Some(DType::Object),
        DataType::Dictionary(_, value) if matches!(**value, DataType::Utf8 | DataType::LargeUtf8) => {
            Some(DType::Category)
        }
        _ => None,
    }
}

fn read_column(arrays: &[&ArrayRef], dtype: DType) -> Result<ColumnData, ReadError> {
    let data = match dtype {
        DType::Numeric => {
            let mut values = Vec::new();
            for array in arrays.iter().copied() {
                let floats = cast(array, &DataType::Float64)?;
                let floats = floats.as_primitive::<Float64Type>();
                values.extend(
                    (0..floats.len())
                        .map(|i| if floats.is_null(i) { f64::NAN } else { floats.value(i) }),
                );
            }
            ColumnData::Numeric(values)
        }
        DType::Boolean => {
            let mut values = Vec::new();
            for array in arrays.iter().copied() {
                let bools = array.as_boolean();
                values.extend((0..bools.len()).map(|i| (!bools.is_null(i)).then(|| bools.value(i))));
            }
            ColumnData::Boolean(values)
        }
        DType::Object => ColumnData::Object(read_strings(arrays)?),
        DType::Category => ColumnData::Category(Categorical::from_labels(read_strings(arrays)?)),
    };
    Ok(data)
}

/// Flatten string-like arrays (plain, large or dictionary encoded) to owned labels.
fn read_strings(arrays: &[&ArrayRef]) -> Result<Vec<Option<String>>, ReadError> {
    let mut values = Vec::new();
    for array in arrays.iter().copied() {
        let strings = cast(array, &DataType::Utf8)?;
        let strings = strings.as_string::<i32>();
        values.extend(
            (0..strings.len())
                .map(|i| (!strings.is_null(i)).then(|| strings.value(i).to_string())),
        );
    }
    Ok(values)
}
