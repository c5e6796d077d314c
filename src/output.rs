//! Writers for [`SummaryTable`]: pretty text, CSV, JSON and Parquet.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::data::summary::SummaryTable;

/// Shown instead of a table when the filters leave nothing to summarise.
pub const EMPTY_MESSAGE: &str = "No data for these filters.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Aligned text table.
    #[default]
    Table,
    Csv,
    Json,
    /// Columnar file; needs an output path.
    Parquet,
}

/// Write `table` to `out` in a text format.
pub fn write_table<W: Write>(table: &SummaryTable, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let batch = table.to_record_batch().context("building record batch")?;
            let pretty = pretty_format_batches(&[batch]).context("formatting table")?;
            writeln!(out, "{pretty}")?;
        }
        OutputFormat::Csv => write_csv(table, out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &to_json(table))?;
            writeln!(out)?;
        }
        OutputFormat::Parquet => bail!("parquet output needs --output <FILE>"),
    }
    Ok(())
}

/// Write `table` to a file; Parquet is only available here.
pub fn write_to_path(table: &SummaryTable, format: OutputFormat, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    match format {
        OutputFormat::Parquet => {
            let batch = table.to_record_batch().context("building record batch")?;
            let mut writer =
                ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
            writer.write(&batch).context("writing parquet batch")?;
            writer.close().context("closing parquet writer")?;
        }
        other => {
            let mut out = std::io::BufWriter::new(file);
            write_table(table, other, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn header(table: &SummaryTable) -> Vec<String> {
    table
        .key_fields
        .iter()
        .chain(&table.value_fields)
        .cloned()
        .chain(["count".to_string()])
        .collect()
}

fn write_csv<W: Write>(table: &SummaryTable, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header(table))?;
    for row in &table.rows {
        let mut cells: Vec<String> = row
            .key
            .iter()
            .map(|k| k.as_key().unwrap_or_default())
            .collect();
        cells.extend(row.values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        cells.push(row.count.to_string());
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

/// Array of flat objects, one per row; missing cells are `null`.
pub fn to_json(table: &SummaryTable) -> JsonValue {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (name, key) in table.key_fields.iter().zip(&row.key) {
                obj.insert(name.clone(), serde_json::to_value(key).unwrap_or(JsonValue::Null));
            }
            for (name, value) in table.value_fields.iter().zip(&row.values) {
                obj.insert(name.clone(), value.map_or(JsonValue::Null, JsonValue::from));
            }
            obj.insert("count".to_string(), JsonValue::from(row.count));
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(rows)
}
