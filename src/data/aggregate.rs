use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Dataset, Record, Value};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Summary rows
// ---------------------------------------------------------------------------

/// Mean of one metric over one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Group key as (field, value) pairs, in `group_fields` order.
    pub group: Vec<(String, Value)>,
    pub metric: String,
    pub mean: f64,
    /// Records that contributed to `mean`.
    pub count: usize,
}

impl SummaryRow {
    /// Group key values without field names.
    pub fn key(&self) -> Vec<&Value> {
        self.group.iter().map(|(_, v)| v).collect()
    }
}

/// How groups are ordered in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Order in which a group key first appears in the input.
    #[default]
    FirstSeen,
    /// Sorted by key `Value` order.
    Lexicographic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateOptions {
    #[serde(default)]
    pub order: GroupOrder,
    /// Treat `Missing` as a group key of its own instead of skipping the record.
    #[serde(default)]
    pub include_missing_keys: bool,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group by the tuple of `group_fields` and average every metric.
///
/// One row per (group, metric) with at least one numeric metric value.
/// Rows are emitted group by group, and within a group in `metric_fields`
/// order.
pub fn aggregate<S: AsRef<str>>(
    dataset: &Dataset,
    group_fields: &[S],
    metric_fields: &[S],
    options: AggregateOptions,
) -> Result<Vec<SummaryRow>> {
    dataset.require_columns(group_fields)?;
    dataset.require_columns(metric_fields)?;

    let mut order: Vec<Vec<Value>> = Vec::new();
    let mut groups: HashMap<Vec<Value>, Vec<Accumulator>> = HashMap::new();

    for record in &dataset.records {
        let key: Vec<Value> = group_fields
            .iter()
            .map(|f| record.get(f.as_ref()).clone())
            .collect();
        if !options.include_missing_keys && key.iter().any(Value::is_missing) {
            continue;
        }

        let accs = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            metric_fields.iter().map(|_| Accumulator::default()).collect()
        });
        for (acc, metric) in accs.iter_mut().zip(metric_fields) {
            if let Some(x) = record.get(metric.as_ref()).as_f64().filter(|x| x.is_finite()) {
                acc.sum += x;
                acc.count += 1;
            }
        }
    }

    if options.order == GroupOrder::Lexicographic {
        order.sort();
    }

    let mut rows = Vec::new();
    for key in order {
        let Some(accs) = groups.get(&key) else {
            continue;
        };
        for (acc, metric) in accs.iter().zip(metric_fields) {
            if acc.count == 0 {
                continue;
            }
            rows.push(SummaryRow {
                group: group_fields
                    .iter()
                    .map(|f| f.as_ref().to_string())
                    .zip(key.iter().cloned())
                    .collect(),
                metric: metric.as_ref().to_string(),
                mean: acc.sum / acc.count as f64,
                count: acc.count,
            });
        }
    }

    debug!(
        "aggregate: {} record(s) -> {} group(s), {} row(s)",
        dataset.len(),
        groups.len(),
        rows.len()
    );
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Composite score
// ---------------------------------------------------------------------------

/// Unweighted mean of the listed metrics present on `record`.
///
/// Missing or non-numeric fields are left out; if none remain the score is
/// `Missing`.
pub fn compose_score<S: AsRef<str>>(record: &Record, metric_fields: &[S]) -> Value {
    let present: Vec<f64> = metric_fields
        .iter()
        .filter_map(|f| record.get(f.as_ref()).as_f64())
        .filter(|x| x.is_finite())
        .collect();
    if present.is_empty() {
        Value::Missing
    } else {
        Value::Number(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Add `target_field` holding [`compose_score`] for every record.
pub fn with_composite<S: AsRef<str>>(
    dataset: &Dataset,
    metric_fields: &[S],
    target_field: &str,
) -> Result<Dataset> {
    dataset.require_columns(metric_fields)?;

    let records = dataset
        .records
        .iter()
        .map(|record| {
            let mut out = record.clone();
            out.set(target_field, compose_score(record, metric_fields));
            out
        })
        .collect();

    let mut scored = dataset.derive(records);
    scored.add_column(target_field);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rock_jazz() -> Dataset {
        Dataset::from_records(vec![
            Record::new()
                .with("Age", 25.0)
                .with("Hours", 2.0)
                .with("Genre", "Rock")
                .with("Anxiety", 5.0),
            Record::new()
                .with("Age", 25.0)
                .with("Hours", 2.0)
                .with("Genre", "Rock")
                .with("Anxiety", 7.0),
            Record::new()
                .with("Age", 40.0)
                .with("Hours", 1.0)
                .with("Genre", "Jazz")
                .with("Anxiety", 3.0),
        ])
    }

    #[test]
    fn groups_in_first_seen_order() {
        let rows = aggregate(&rock_jazz(), &["Genre"], &["Anxiety"], Default::default()).unwrap();
        let summary: Vec<(String, f64)> = rows
            .iter()
            .map(|r| (r.key()[0].to_string(), r.mean))
            .collect();
        assert_eq!(
            summary,
            vec![("Rock".to_string(), 6.0), ("Jazz".to_string(), 3.0)]
        );
        assert_eq!(rows[0].count, 2);
    }

    #[test]
    fn nan_group_key_forms_one_group() {
        let ds = Dataset::from_records(vec![
            Record::new().with("g", f64::NAN).with("m", 1.0),
            Record::new().with("g", f64::NAN).with("m", 3.0),
            Record::new().with("g", "a").with("m", 5.0),
        ]);
        for order in [GroupOrder::FirstSeen, GroupOrder::Lexicographic] {
            let opts = AggregateOptions {
                order,
                ..Default::default()
            };
            let rows = aggregate(&ds, &["g"], &["m"], opts).unwrap();
            let summary: Vec<(String, f64, usize)> = rows
                .iter()
                .map(|r| (r.key()[0].to_string(), r.mean, r.count))
                .collect();
            assert_eq!(
                summary,
                vec![("NaN".to_string(), 2.0, 2), ("a".to_string(), 5.0, 1)]
            );
        }
    }

    #[test]
    fn lexicographic_order() {
        let opts = AggregateOptions {
            order: GroupOrder::Lexicographic,
            ..Default::default()
        };
        let rows = aggregate(&rock_jazz(), &["Genre"], &["Anxiety"], opts).unwrap();
        assert_eq!(rows[0].key(), vec![&Value::from("Jazz")]);
    }

    #[test]
    fn empty_input_gives_no_rows() {
        let empty = rock_jazz().derive(Vec::new());
        let rows = aggregate(&empty, &["Genre"], &["Anxiety"], Default::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_metric_is_excluded_from_mean() {
        let mut ds = rock_jazz();
        ds.records[1].set("Anxiety", Value::Missing);
        let rows = aggregate(&ds, &["Genre"], &["Anxiety"], Default::default()).unwrap();
        assert_eq!(rows[0].mean, 5.0);
        assert_eq!(rows[0].count, 1);
    }

    #[test]
    fn group_with_no_metric_values_is_omitted() {
        let mut ds = rock_jazz();
        ds.records[2].set("Anxiety", Value::Missing);
        let rows = aggregate(&ds, &["Genre"], &["Anxiety"], Default::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key(), vec![&Value::from("Rock")]);
    }

    #[test]
    fn missing_keys_skipped_unless_requested() {
        let mut ds = rock_jazz();
        ds.records[2].set("Genre", Value::Missing);
        let rows = aggregate(&ds, &["Genre"], &["Anxiety"], Default::default()).unwrap();
        assert_eq!(rows.len(), 1);

        let opts = AggregateOptions {
            include_missing_keys: true,
            ..Default::default()
        };
        let rows = aggregate(&ds, &["Genre"], &["Anxiety"], opts).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].key(), vec![&Value::Missing]);
    }

    #[test]
    fn multiple_group_fields_and_metrics() {
        let mut ds = rock_jazz();
        for (r, d) in ds.records.iter_mut().zip([1.0, 3.0, 8.0]) {
            r.set("Depression", Value::Number(d));
        }
        ds.add_column("Depression");
        let rows = aggregate(&ds, &["Genre", "Age"], &["Anxiety", "Depression"], Default::default())
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].metric, "Depression");
        assert_eq!(rows[1].mean, 2.0);
        assert_eq!(rows[2].group[1], ("Age".to_string(), Value::Number(40.0)));
    }

    #[test]
    fn unknown_metric_is_a_schema_error() {
        assert!(aggregate(&rock_jazz(), &["Genre"], &["OCD"], Default::default()).is_err());
    }

    #[test]
    fn compose_score_skips_missing() {
        let r = Record::new()
            .with("Anxiety", 6.0)
            .with("Depression", Value::Missing)
            .with("Insomnia", 2.0);
        assert_eq!(
            compose_score(&r, &["Anxiety", "Depression", "Insomnia"]),
            Value::Number(4.0)
        );
        let none = Record::new().with("Anxiety", Value::Missing);
        assert_eq!(compose_score(&none, &["Anxiety", "Depression"]), Value::Missing);
    }

    #[test]
    fn with_composite_adds_column() {
        let ds = with_composite(&rock_jazz(), &["Anxiety"], "score").unwrap();
        assert!(ds.has_column("score"));
        assert_eq!(ds.records[2].get("score"), &Value::Number(3.0));
    }
}
