use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use super::aggregate::SummaryRow;
use super::bins::BinSpec;
use super::model::Value;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// SummaryTable – wide view of summary rows
// ---------------------------------------------------------------------------

/// One output row: a group key and one cell per value column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub key: Vec<Value>,
    pub values: Vec<Option<f64>>,
    /// Largest per-metric record count behind this row.
    pub count: usize,
}

/// Group keys down, metrics across.  Ready for a chart or table renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    pub key_fields: Vec<String>,
    pub value_fields: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl SummaryTable {
    /// Pivot long-form rows into one row per group, in first-appearance order.
    pub fn from_rows<S: AsRef<str>>(rows: &[SummaryRow], group_fields: &[S], metric_fields: &[S]) -> Self {
        let value_fields: Vec<String> = metric_fields.iter().map(|m| m.as_ref().to_string()).collect();
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut out: Vec<TableRow> = Vec::new();

        for row in rows {
            let key: Vec<Value> = row.key().into_iter().cloned().collect();
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                out.push(TableRow {
                    key,
                    values: vec![None; value_fields.len()],
                    count: 0,
                });
                out.len() - 1
            });
            if let Some(col) = value_fields.iter().position(|m| *m == row.metric) {
                out[slot].values[col] = Some(row.mean);
                out[slot].count = out[slot].count.max(row.count);
            }
        }

        SummaryTable {
            key_fields: group_fields.iter().map(|g| g.as_ref().to_string()).collect(),
            value_fields,
            rows: out,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Append a column with the mean of each row's present cells.
    pub fn with_row_mean(mut self, name: &str) -> Self {
        for row in &mut self.rows {
            let present: Vec<f64> = row.values.iter().flatten().copied().collect();
            let mean = (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64);
            row.values.push(mean);
        }
        self.value_fields.push(name.to_string());
        self
    }

    /// Cell lookup by key position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.value_fields.iter().position(|c| c == column)?;
        self.rows.get(row)?.values[col]
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.value_fields
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: column.to_string(),
                available: self.value_fields.clone(),
            })
    }

    /// Stable sort on a value column; empty cells always go last.
    pub fn sort_by(mut self, column: &str, descending: bool) -> Result<Self> {
        let col = self.column_index(column)?;
        self.rows.sort_by(|a, b| match (a.values[col], b.values[col]) {
            (Some(x), Some(y)) if descending => y.total_cmp(&x),
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(self)
    }

    /// Order rows by the bin order of a binned key field.
    pub fn sort_by_bins(mut self, key_field: &str, spec: &BinSpec) -> Result<Self> {
        let pos = self
            .key_fields
            .iter()
            .position(|k| k == key_field)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: key_field.to_string(),
                available: self.key_fields.clone(),
            })?;
        self.rows.sort_by_key(|row| match &row.key[pos] {
            Value::Text(label) => spec.rank_of(label).unwrap_or(usize::MAX),
            _ => usize::MAX,
        });
        Ok(self)
    }

    /// Arrow view: Utf8 key columns, nullable Float64 value columns, UInt64 `count`.
    pub fn to_record_batch(&self) -> std::result::Result<RecordBatch, ArrowError> {
        let mut fields = Vec::new();
        let mut columns: Vec<ArrayRef> = Vec::new();

        for (i, name) in self.key_fields.iter().enumerate() {
            fields.push(Field::new(name, DataType::Utf8, true));
            let keys: StringArray = self.rows.iter().map(|r| r.key[i].as_key()).collect();
            columns.push(Arc::new(keys));
        }
        for (i, name) in self.value_fields.iter().enumerate() {
            fields.push(Field::new(name, DataType::Float64, true));
            let values: Float64Array = self.rows.iter().map(|r| r.values[i]).collect();
            columns.push(Arc::new(values));
        }
        fields.push(Field::new("count", DataType::UInt64, false));
        let counts: UInt64Array = self.rows.iter().map(|r| Some(r.count as u64)).collect();
        columns.push(Arc::new(counts));

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
    }
}
