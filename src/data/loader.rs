use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Record, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the survey once, from a URL or a local file.
///
/// Supported sources:
/// * `http://…` / `https://…` – remote CSV
/// * `.csv`     – header row, one respondent per line
/// * `.json`    – `[{ "Age": 18, "Fav genre": "Rock", ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_source(location: &str) -> Result<Dataset> {
    let dataset = if location.starts_with("http://") || location.starts_with("https://") {
        load_remote_csv(location)?
    } else {
        load_file(Path::new(location))?
    };
    info!(
        "loaded {} record(s), {} column(s) from {location}",
        dataset.len(),
        dataset.column_names.len()
    );
    Ok(dataset)
}

/// Load a local file.  Dispatch by extension.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            read_csv(file)
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_remote_csv(url: &str) -> Result<Dataset> {
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("fetching {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching {url}"))?;
    let body = response.bytes().context("reading response body")?;
    read_csv(body.as_ref())
}

/// Header row with column names; every other row is one record.
/// Cells are classified with [`Value::guess`].
pub fn read_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    let mut short_rows = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        if row.len() < headers.len() {
            short_rows += 1;
        }
        let mut record = Record::new();
        for (col_idx, name) in headers.iter().enumerate() {
            record.set(name, Value::guess(row.get(col_idx).unwrap_or("")));
        }
        records.push(record);
    }

    if short_rows > 0 {
        warn!("{short_rows} CSV row(s) had fewer cells than the header; padded with missing");
    }
    Ok(Dataset::with_columns(headers, records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    read_json(&text)
}

pub fn read_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let mut record = Record::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            record.set(key, json_to_value(val));
        }
        records.push(record);
    }

    Ok(Dataset::with_columns(columns, records))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::Null => Value::Missing,
        JsonValue::Number(n) => n.as_f64().map_or(Value::Missing, Value::Number),
        JsonValue::String(s) => Value::guess(s),
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet schema: numeric columns become numbers, string columns are
/// classified like CSV cells, nulls are missing.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let mut record = Record::new();
            for (col_idx, name) in columns.iter().enumerate() {
                let value = extract_value(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{name}'"))?;
                record.set(name, value);
            }
            records.push(record);
        }
    }

    Ok(Dataset::with_columns(columns, records))
}

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("unexpected array type {:?}", col.data_type()))
}

/// NaN and infinities are missing, as in CSV cells.
fn finite(x: f64) -> Value {
    if x.is_finite() {
        Value::Number(x)
    } else {
        Value::Missing
    }
}

/// Extract a single cell from an Arrow column.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Missing);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::guess(downcast::<StringArray>(col)?.value(row)),
        DataType::LargeUtf8 => Value::guess(downcast::<LargeStringArray>(col)?.value(row)),
        DataType::Utf8View => Value::guess(col.as_string_view().value(row)),
        DataType::Int32 => Value::Number(downcast::<Int32Array>(col)?.value(row) as f64),
        DataType::Int64 => Value::Number(downcast::<Int64Array>(col)?.value(row) as f64),
        DataType::UInt32 => Value::Number(downcast::<UInt32Array>(col)?.value(row) as f64),
        DataType::UInt64 => Value::Number(downcast::<UInt64Array>(col)?.value(row) as f64),
        DataType::Float32 => finite(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => finite(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => Value::Text(downcast::<BooleanArray>(col)?.value(row).to_string()),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}
