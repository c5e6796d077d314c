use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Dataset, Record, Value};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Constraint predicates
// ---------------------------------------------------------------------------

/// A single predicate over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Numeric range, inclusive on both ends.
    Range { field: String, lo: f64, hi: f64 },
    /// Set membership on the textual value.
    OneOf {
        field: String,
        values: BTreeSet<String>,
    },
    /// Single-value selection (age group, category).
    Equals { field: String, value: String },
}

impl Constraint {
    pub fn range(field: &str, lo: f64, hi: f64) -> Self {
        Constraint::Range {
            field: field.to_string(),
            lo,
            hi,
        }
    }

    pub fn one_of<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::OneOf {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn equals(field: &str, value: &str) -> Self {
        Constraint::Equals {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Constraint::Range { field, .. }
            | Constraint::OneOf { field, .. }
            | Constraint::Equals { field, .. } => field,
        }
    }

    /// A record whose constrained field is missing never passes.
    ///
    /// * `Range` with `lo > hi` rejects everything.
    /// * `OneOf` with an empty selection rejects everything.
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.get(self.field());
        match self {
            Constraint::Range { lo, hi, .. } => match value {
                Value::Number(n) => *lo <= *n && *n <= *hi,
                _ => false,
            },
            Constraint::OneOf { values, .. } => value
                .as_key()
                .is_some_and(|key| values.contains(&key)),
            Constraint::Equals { value: wanted, .. } => {
                value.as_key().is_some_and(|key| key == *wanted)
            }
        }
    }
}

/// Conjunction of predicates.  An empty set keeps every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// `self ∧ other`.
    pub fn and(&self, other: &ConstraintSet) -> ConstraintSet {
        let mut constraints = self.constraints.clone();
        constraints.extend(other.constraints.iter().cloned());
        ConstraintSet { constraints }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(Constraint::field)
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.constraints.iter().all(|c| c.matches(record))
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of records that pass every constraint.
pub fn filtered_indices(dataset: &Dataset, constraints: &ConstraintSet) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| constraints.matches(record))
        .map(|(i, _)| i)
        .collect()
}

/// The order-preserving subsequence of records satisfying `constraints`.
pub fn filter(dataset: &Dataset, constraints: &ConstraintSet) -> Result<Dataset> {
    let fields: Vec<&str> = constraints.fields().collect();
    dataset.require_columns(&fields)?;

    let records: Vec<Record> = filtered_indices(dataset, constraints)
        .into_iter()
        .map(|i| dataset.records[i].clone())
        .collect();

    debug!(
        "filter: {} constraint(s) kept {} of {} record(s)",
        constraints.constraints.len(),
        records.len(),
        dataset.len()
    );
    Ok(dataset.derive(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Dataset {
        Dataset::from_records(vec![
            Record::new()
                .with("Age", 25.0)
                .with("Fav genre", "Rock")
                .with("Hours", 2.0),
            Record::new()
                .with("Age", 40.0)
                .with("Fav genre", "Jazz")
                .with("Hours", 1.0),
            Record::new()
                .with("Age", Value::Missing)
                .with("Fav genre", "Rock")
                .with("Hours", 5.0),
        ])
    }

    #[test]
    fn range_is_inclusive() {
        let cs = ConstraintSet::new().with(Constraint::range("Age", 25.0, 40.0));
        assert_eq!(filtered_indices(&survey(), &cs), vec![0, 1]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let cs = ConstraintSet::new().with(Constraint::range("Age", 60.0, 10.0));
        assert!(filter(&survey(), &cs).unwrap().is_empty());
    }

    #[test]
    fn empty_selection_is_empty() {
        let cs = ConstraintSet::new().with(Constraint::one_of("Fav genre", Vec::<String>::new()));
        assert!(filter(&survey(), &cs).unwrap().is_empty());
    }

    #[test]
    fn missing_value_fails_predicate() {
        let cs = ConstraintSet::new().with(Constraint::range("Age", 0.0, 100.0));
        let out = filter(&survey(), &cs).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn conjunction_of_predicates() {
        let cs = ConstraintSet::new()
            .with(Constraint::one_of("Fav genre", ["Rock"]))
            .with(Constraint::range("Hours", 0.0, 3.0));
        assert_eq!(filtered_indices(&survey(), &cs), vec![0]);
    }

    #[test]
    fn equals_matches_text_form() {
        let cs = ConstraintSet::new().with(Constraint::equals("Fav genre", "Jazz"));
        assert_eq!(filtered_indices(&survey(), &cs), vec![1]);
    }

    #[test]
    fn empty_constraint_set_keeps_everything() {
        let out = filter(&survey(), &ConstraintSet::new()).unwrap();
        assert_eq!(out, survey());
    }

    #[test]
    fn unknown_field_is_a_schema_error() {
        let cs = ConstraintSet::new().with(Constraint::equals("Country", "NZ"));
        assert!(filter(&survey(), &cs).is_err());
    }
}
