//! Data file naming and parsing
//!
//! Supported layouts mirror what the Hub produces for text datasets:
//! `train.jsonl` at the root, or `data/train-00000-of-00001.parquet`.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::error::ArrowError;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Number, Value};

use crate::hf_pipeline::error::{FetchError, Result};

use super::text_dataset::Record;

/// Supported data file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// One JSON object per line
    JsonLines,
    /// Array of objects, or `{"data": [...]}`
    Json,
    /// One `text` record per line
    Text,
    /// Columnar rows, the Hub's converted dataset format
    Parquet,
}

impl DataFormat {
    /// Format implied by a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "jsonl" => Some(Self::JsonLines),
            "json" => Some(Self::Json),
            "txt" => Some(Self::Text),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Whether a repo-relative file path (`/`-separated) holds rows of `split`
#[must_use]
pub fn matches_split(relative: &str, split: &str) -> bool {
    let path = Path::new(relative);
    if DataFormat::from_path(path).is_none() {
        return false;
    }
    let (dir, name) = match relative.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, relative),
    };
    let Some(rest) = name.strip_prefix(split) else {
        return false;
    };
    match dir {
        None => path.file_stem().and_then(|s| s.to_str()) == Some(split),
        Some("data") => rest.starts_with(['-', '_', '.']),
        Some(_) => false,
    }
}

fn invalid(path: &Path, line: usize, message: impl Into<String>) -> FetchError {
    FetchError::InvalidRecord {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn into_record(path: &Path, line: usize, value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(invalid(
            path,
            line,
            format!("expected a JSON object, found {other}"),
        )),
    }
}

/// Read every record of one data file
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let format = DataFormat::from_path(path).ok_or_else(|| FetchError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    match format {
        DataFormat::Parquet => read_parquet(path),
        DataFormat::JsonLines => std::fs::read_to_string(path)?
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                let value: Value = serde_json::from_str(line)
                    .map_err(|e| invalid(path, i + 1, e.to_string()))?;
                into_record(path, i + 1, value)
            })
            .collect(),
        DataFormat::Json => {
            let value: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let rows = match value {
                Value::Array(rows) => rows,
                Value::Object(mut obj) => match obj.remove("data") {
                    Some(Value::Array(rows)) => rows,
                    _ => return Err(invalid(path, 0, "expected an array or {\"data\": [...]}")),
                },
                _ => return Err(invalid(path, 0, "expected an array or {\"data\": [...]}")),
            };
            rows.into_iter()
                .enumerate()
                .map(|(i, row)| into_record(path, i + 1, row))
                .collect()
        }
        DataFormat::Text => Ok(std::fs::read_to_string(path)?
            .lines()
            .map(|line| {
                let mut record = Record::new();
                record.insert("text".to_string(), Value::String(line.to_string()));
                record
            })
            .collect()),
    }
}

/// One cell as JSON; nested and temporal types fall back to their display form
fn cell_value(column: &dyn Array, row: usize) -> std::result::Result<Value, ArrowError> {
    if column.is_null(row) {
        return Ok(Value::Null);
    }
    let any = column.as_any();
    let value = if let Some(a) = any.downcast_ref::<StringArray>() {
        Value::String(a.value(row).to_string())
    } else if let Some(a) = any.downcast_ref::<LargeStringArray>() {
        Value::String(a.value(row).to_string())
    } else if let Some(a) = any.downcast_ref::<BooleanArray>() {
        Value::Bool(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Int64Array>() {
        Value::from(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Int32Array>() {
        Value::from(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Float64Array>() {
        Number::from_f64(a.value(row)).map_or(Value::Null, Value::Number)
    } else if let Some(a) = any.downcast_ref::<Float32Array>() {
        Number::from_f64(f64::from(a.value(row))).map_or(Value::Null, Value::Number)
    } else {
        Value::String(array_value_to_string(column, row)?)
    };
    Ok(value)
}

fn read_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| invalid(path, 0, format!("cannot open parquet file: {e}")))?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| invalid(path, records.len() + 1, e.to_string()))?;
        let schema = batch.schema();
        for row in 0..batch.num_rows() {
            let line = records.len() + 1;
            let mut record = Record::new();
            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                let value = cell_value(column.as_ref(), row)
                    .map_err(|e| invalid(path, line, format!("{}: {e}", field.name())))?;
                record.insert(field.name().clone(), value);
            }
            records.push(record);
        }
    }
    Ok(records)
}

/// Concatenate the records of several files in order
pub fn read_all(paths: &[PathBuf]) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for path in paths {
        records.extend(read_records(path)?);
    }
    Ok(records)
}
