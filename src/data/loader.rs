use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, FieldKind, FieldValue, Record, Schema, SchemaError};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the stroke dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one patient per line (the Kaggle export)
/// * `.json`    – `[{ "gender": "Male", "age": 67, ... }, ...]`
/// * `.parquet` – flat columns named after the schema fields
///
/// Every declared column must be present; a missing one is a
/// [`SchemaError::MissingColumn`] and the load fails.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows from {} ({} columns)",
        dataset.len(),
        path.display(),
        dataset.column_names.len()
    );
    Ok(dataset)
}

/// Coerce one cell to its declared kind, or report which cell is broken.
/// `row` is the 1-based data row, as a user counts records in the file.
fn coerce(kind: FieldKind, value: FieldValue, row: usize, column: &str) -> Result<FieldValue, SchemaError> {
    let coerced = match &value {
        FieldValue::Text(s) => kind.parse_cell(s),
        other => kind.normalize(other),
    };
    coerced.ok_or_else(|| SchemaError::InvalidCell {
        row,
        column: column.to_string(),
        value: value.to_string(),
        kind,
    })
}

fn require_columns(schema: &Schema, mut present: impl FnMut(&str) -> bool) -> Result<(), SchemaError> {
    match schema.fields().iter().find(|f| !present(f.name)) {
        Some(missing) => Err(SchemaError::MissingColumn(missing.name.to_string())),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader, Schema::stroke())
}

/// Parse CSV rows, coercing declared columns and keeping the rest as guessed values.
pub fn read_csv<R: io::Read>(mut reader: csv::Reader<R>, schema: Schema) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    require_columns(&schema, |name| headers.iter().any(|h| h == name))?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        // 1-based data row, header excluded.
        let row_no = row_no + 1;
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut record = Record::default();
        for (col_idx, raw) in row.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            let value = match schema.kind_of(col_name) {
                Some(kind) => coerce(kind, FieldValue::Text(raw.to_string()), row_no, col_name)?,
                None => guess_value_type(raw),
            };
            record.values.insert(col_name.clone(), value);
        }
        records.push(record);
    }

    Ok(Dataset::from_records(schema, records))
}

fn guess_value_type(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    FieldValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "gender": "Male", "age": 67, "hypertension": 0, "bmi": 36.6, ... },
///   { "gender": "Female", "age": 61, "hypertension": 0, "bmi": null, ... }
/// ]
/// ```
///
/// A declared column absent from every object is missing; absent from a
/// single object it reads as a missing cell.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text, Schema::stroke())
}

pub fn parse_json(text: &str, schema: Schema) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let objects = rows
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            rec.as_object()
                .with_context(|| format!("Row {} is not a JSON object", i + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    if !objects.is_empty() {
        require_columns(&schema, |name| objects.iter().any(|o| o.contains_key(name)))?;
    }

    let mut records = Vec::with_capacity(objects.len());
    for (i, obj) in objects.into_iter().enumerate() {
        let mut record = Record::default();
        for field in schema.fields() {
            let raw = obj.get(field.name).map(json_to_value).unwrap_or(FieldValue::Null);
            record
                .values
                .insert(field.name.to_string(), coerce(field.kind, raw, i + 1, field.name)?);
        }
        for (key, val) in obj {
            if schema.field(key).is_none() {
                record.values.insert(key.clone(), json_to_value(val));
            }
        }
        records.push(record);
    }

    Ok(Dataset::from_records(schema, records))
}

fn json_to_value(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), and with the output of `generate_sample`.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let schema = Schema::stroke();
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let arrow_schema = builder.schema().clone();
    require_columns(&schema, |name| arrow_schema.index_of(name).is_ok())?;

    let reader = builder.build().context("building parquet reader")?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_schema = batch.schema();
        let offset = records.len();

        for row in 0..batch.num_rows() {
            let mut record = Record::default();
            for (col_idx, field) in batch_schema.fields().iter().enumerate() {
                let name = field.name();
                let raw = extract_value(batch.column(col_idx), row);
                let value = match schema.kind_of(name) {
                    Some(kind) => coerce(kind, raw, offset + row + 1, name)?,
                    None => raw,
                };
                record.values.insert(name.clone(), value);
            }
            records.push(record);
        }
    }

    Ok(Dataset::from_records(schema, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| FieldValue::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|a| FieldValue::Text(a.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| FieldValue::Integer(i64::from(a.value(row)))),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| FieldValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| FieldValue::Float(f64::from(a.value(row)))),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| FieldValue::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| FieldValue::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| FieldValue::Text(format!("{:?}", col.data_type())))
}
