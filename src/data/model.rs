use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell of the survey table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell.  `Missing` is the missing marker: a value that
/// was absent or could not be parsed.  It is distinct from `Number(0.0)` and
/// from `Text("")`.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

// -- Manual Eq/Ord/Hash so Value can key BTreeMap and HashMap alike --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Missing => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => n.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Missing => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

/// Numbers as JSON numbers, text as strings, `Missing` as `null`.
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Missing => serializer.serialize_none(),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// The numeric payload, if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Classify a raw text cell the way the loaders do: blank → `Missing`,
    /// finite float → `Number`, anything else → `Text`.
    pub fn guess(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match parse_number(trimmed) {
            Some(n) => Value::Number(n),
            None => Value::Text(raw.to_string()),
        }
    }

    /// Numeric conversion that never fails: unparsable text becomes `Missing`.
    pub fn coerce_numeric(&self) -> Value {
        match self {
            Value::Number(n) if n.is_finite() => Value::Number(*n),
            Value::Text(s) => parse_number(s.trim()).map_or(Value::Missing, Value::Number),
            _ => Value::Missing,
        }
    }

    /// Textual form used by categorical predicates.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

// ---------------------------------------------------------------------------
// Record – one survey respondent
// ---------------------------------------------------------------------------

/// One row of the survey: column name → cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for hand-written datasets.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// A field that is absent from the record reads as `Missing`.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Missing)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the loaded survey
// ---------------------------------------------------------------------------

/// An ordered collection of records and the columns they were loaded with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// All records, in source order.
    pub records: Vec<Record>,
    /// Column names in header order.
    pub column_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset from records, collecting column names in first-seen order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut column_names = Vec::new();
        let mut seen = BTreeSet::new();
        for record in &records {
            for col in record.fields.keys() {
                if seen.insert(col.clone()) {
                    column_names.push(col.clone());
                }
            }
        }
        Dataset {
            records,
            column_names,
        }
    }

    /// Build a dataset with an explicit column order (e.g. a CSV header).
    pub fn with_columns(column_names: Vec<String>, records: Vec<Record>) -> Self {
        Dataset {
            records,
            column_names,
        }
    }

    /// Same columns, different rows.
    pub fn derive(&self, records: Vec<Record>) -> Self {
        Dataset {
            records,
            column_names: self.column_names.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Fail with a schema error if any of `columns` is absent.
    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<()> {
        for column in columns {
            let column = column.as_ref();
            if !self.has_column(column) {
                return Err(PipelineError::MissingColumn {
                    column: column.to_string(),
                    available: self.column_names.clone(),
                });
            }
        }
        Ok(())
    }

    /// Register a derived column, keeping header order.
    pub fn add_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.column_names.push(column.to_string());
        }
    }

    /// Sorted distinct non-missing values of a column.
    pub fn unique_values(&self, column: &str) -> BTreeSet<Value> {
        self.records
            .iter()
            .map(|r| r.get(column))
            .filter(|v| !v.is_missing())
            .cloned()
            .collect()
    }

    /// Min and max over the numeric cells of a column.
    pub fn numeric_span(&self, column: &str) -> Option<(f64, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.get(column).coerce_numeric().as_f64())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
