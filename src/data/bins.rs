use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{Dataset, Value};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Labelled partition of a numeric range
// ---------------------------------------------------------------------------

/// Contiguous, non-overlapping intervals over `edges[0]..=edges[n]`.
///
/// Edge policy: bin `i` is `[edges[i], edges[i+1])`, except the last bin
/// which is closed `[edges[n-1], edges[n]]`.  Anything outside the span is
/// out of range and maps to `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBinSpec", into = "RawBinSpec")]
pub struct BinSpec {
    edges: Vec<f64>,
    labels: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct RawBinSpec {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl TryFrom<RawBinSpec> for BinSpec {
    type Error = PipelineError;

    fn try_from(raw: RawBinSpec) -> Result<Self> {
        BinSpec::new(raw.edges, raw.labels)
    }
}

impl From<BinSpec> for RawBinSpec {
    fn from(spec: BinSpec) -> Self {
        RawBinSpec {
            edges: spec.edges,
            labels: spec.labels,
        }
    }
}

impl BinSpec {
    /// Validate and build a spec: at least two finite, strictly ascending
    /// edges and exactly one label per interval.
    pub fn new(edges: Vec<f64>, labels: Vec<String>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(PipelineError::InvalidBins(format!(
                "need at least 2 edges, got {}",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(PipelineError::InvalidBins(format!("edge {bad} is not finite")));
        }
        if let Some(w) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PipelineError::InvalidBins(format!(
                "edges must be strictly ascending ({} >= {})",
                w[0], w[1]
            )));
        }
        if labels.len() != edges.len() - 1 {
            return Err(PipelineError::InvalidBins(format!(
                "{} edges need {} labels, got {}",
                edges.len(),
                edges.len() - 1,
                labels.len()
            )));
        }
        Ok(BinSpec { edges, labels })
    }

    /// `n` equal-width bins over `[lo, hi]`, labelled by their interval.
    pub fn uniform(lo: f64, hi: f64, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(PipelineError::InvalidBins("need at least one bin".into()));
        }
        let width = (hi - lo) / n as f64;
        let edges: Vec<f64> = (0..=n)
            .map(|i| if i == n { hi } else { lo + width * i as f64 })
            .collect();
        let labels = edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let close = if i == n - 1 { ']' } else { ')' };
                format!("[{}, {}{close}", trim_edge(w[0]), trim_edge(w[1]))
            })
            .collect();
        BinSpec::new(edges, labels)
    }

    /// Survey age groups.  Age 20 falls in `20-29`; age 60 in `60+`.
    pub fn age_groups() -> Self {
        BinSpec {
            edges: vec![0.0, 20.0, 30.0, 40.0, 50.0, 60.0, 120.0],
            labels: ["Under 20", "20-29", "30-39", "40-49", "50-59", "60+"]
                .map(String::from)
                .to_vec(),
        }
    }

    /// Daily listening-time bands.
    pub fn hours_bands() -> Self {
        BinSpec {
            edges: vec![0.0, 1.0, 3.0, 6.0, 24.0],
            labels: ["<1h", "1-3h", "3-6h", "6h+"].map(String::from).to_vec(),
        }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the interval containing `x`, if any.
    pub fn index_of(&self, x: f64) -> Option<usize> {
        let n = self.labels.len();
        let (first, last) = (self.edges[0], self.edges[n]);
        if x.is_nan() || x < first || x > last {
            return None;
        }
        if x == last {
            return Some(n - 1);
        }
        // partition_point: number of edges <= x, so the bin is one less
        Some(self.edges.partition_point(|e| *e <= x) - 1)
    }

    /// Position of a label in bin order.
    pub fn rank_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

fn trim_edge(e: f64) -> String {
    if e.fract() == 0.0 {
        format!("{e:.0}")
    } else {
        format!("{e:.2}")
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Label of the bin containing `value`, or `Missing` when the value is
/// missing, non-numeric or out of range.
pub fn assign_bin(value: &Value, spec: &BinSpec) -> Value {
    value
        .as_f64()
        .and_then(|x| spec.index_of(x))
        .map_or(Value::Missing, |i| Value::Text(spec.labels[i].clone()))
}

/// Add (or overwrite) `target_field` with the bin label of `source_field`.
pub fn apply_bins(
    dataset: &Dataset,
    source_field: &str,
    spec: &BinSpec,
    target_field: &str,
) -> Result<Dataset> {
    dataset.require_columns(&[source_field])?;

    let records = dataset
        .records
        .iter()
        .map(|record| {
            let mut out = record.clone();
            out.set(target_field, assign_bin(record.get(source_field), spec));
            out
        })
        .collect();

    let mut binned = dataset.derive(records);
    binned.add_column(target_field);
    debug!("apply_bins: {source_field} -> {target_field} ({} bins)", spec.labels.len());
    Ok(binned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn label(v: f64, spec: &BinSpec) -> Value {
        assign_bin(&Value::Number(v), spec)
    }

    #[test]
    fn age_group_boundaries() {
        let spec = BinSpec::age_groups();
        assert_eq!(label(19.99, &spec), Value::from("Under 20"));
        assert_eq!(label(20.0, &spec), Value::from("20-29"));
        assert_eq!(label(59.0, &spec), Value::from("50-59"));
        assert_eq!(label(60.0, &spec), Value::from("60+"));
        assert_eq!(label(120.0, &spec), Value::from("60+"));
        assert_eq!(label(0.0, &spec), Value::from("Under 20"));
    }

    #[test]
    fn out_of_range_and_missing() {
        let spec = BinSpec::age_groups();
        assert_eq!(label(-1.0, &spec), Value::Missing);
        assert_eq!(label(121.0, &spec), Value::Missing);
        assert_eq!(label(f64::NAN, &spec), Value::Missing);
        assert_eq!(assign_bin(&Value::Missing, &spec), Value::Missing);
        assert_eq!(assign_bin(&Value::from("old"), &spec), Value::Missing);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(BinSpec::new(vec![0.0], vec![]).is_err());
        assert!(BinSpec::new(vec![0.0, 10.0, 10.0], vec!["a".into(), "b".into()]).is_err());
        assert!(BinSpec::new(vec![0.0, 10.0], vec![]).is_err());
        assert!(BinSpec::new(vec![0.0, f64::INFINITY], vec!["a".into()]).is_err());
        assert!(BinSpec::uniform(0.0, 10.0, 0).is_err());
    }

    #[test]
    fn uniform_labels_and_last_bin_closed() {
        let spec = BinSpec::uniform(0.0, 24.0, 4).unwrap();
        assert_eq!(
            spec.labels(),
            &["[0, 6)", "[6, 12)", "[12, 18)", "[18, 24]"].map(String::from)
        );
        assert_eq!(label(6.0, &spec), Value::from("[6, 12)"));
        assert_eq!(label(24.0, &spec), Value::from("[18, 24]"));
    }

    #[test]
    fn deserialize_validates() {
        let ok: BinSpec =
            serde_json::from_str(r#"{"edges":[0,1,2],"labels":["a","b"]}"#).unwrap();
        assert_eq!(ok.rank_of("b"), Some(1));
        let bad = serde_json::from_str::<BinSpec>(r#"{"edges":[2,1],"labels":["a"]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn apply_bins_adds_column() {
        let ds = Dataset::from_records(vec![
            Record::new().with("Age", 18.0),
            Record::new().with("Age", 45.0),
            Record::new().with("Age", Value::Missing),
        ]);
        let binned = apply_bins(&ds, "Age", &BinSpec::age_groups(), "Age group").unwrap();
        assert!(binned.has_column("Age group"));
        assert_eq!(binned.records[1].get("Age group"), &Value::from("40-49"));
        assert_eq!(binned.records[2].get("Age group"), &Value::Missing);
        assert!(!ds.has_column("Age group"));
    }
}
