//! The parameterised filter-bin-aggregate pipeline.
//!
//! Every dashboard view is one [`Pipeline`] value.  Running it never mutates
//! the loaded dataset; each run recomputes from scratch.

use std::collections::BTreeSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::{aggregate, with_composite, AggregateOptions, SummaryRow};
use crate::data::bins::{apply_bins, BinSpec};
use crate::data::clean::{coerce_numeric, drop_incomplete};
use crate::data::filter::{filter, ConstraintSet};
use crate::data::model::Dataset;
use crate::error::{PipelineError, Result};

/// Derive `target` by binning `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStep {
    pub source: String,
    pub target: String,
    pub spec: BinSpec,
}

/// Per-record composite of several metrics, aggregated like any other metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeStep {
    pub name: String,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Fields converted to numbers before anything else.
    pub numeric_fields: Vec<String>,
    pub bins: Vec<BinStep>,
    pub composite: Option<CompositeStep>,
    /// Records missing any of these are dropped, in addition to group and
    /// metric fields.
    pub required_fields: Vec<String>,
    pub constraints: ConstraintSet,
    pub group_fields: Vec<String>,
    pub metric_fields: Vec<String>,
    pub options: AggregateOptions,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numeric<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.numeric_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn bin(mut self, source: &str, spec: BinSpec, target: &str) -> Self {
        self.bins.push(BinStep {
            source: source.to_string(),
            target: target.to_string(),
            spec,
        });
        self
    }

    pub fn composite<I: IntoIterator<Item = S>, S: Into<String>>(mut self, name: &str, metrics: I) -> Self {
        self.composite = Some(CompositeStep {
            name: name.to_string(),
            metrics: metrics.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn require<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.required_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn constrain(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = self.constraints.and(&constraints);
        self
    }

    pub fn group_by<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.group_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn metrics<I: IntoIterator<Item = S>, S: Into<String>>(mut self, fields: I) -> Self {
        self.metric_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: AggregateOptions) -> Self {
        self.options = options;
        self
    }

    /// Check every field the pipeline names before touching any record.
    ///
    /// A bin target or composite name counts as available only to the steps
    /// after the one that defines it.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        let mut available: BTreeSet<&str> = dataset.column_names.iter().map(String::as_str).collect();
        fn require(field: &str, available: &BTreeSet<&str>) -> Result<()> {
            if available.contains(field) {
                Ok(())
            } else {
                Err(PipelineError::MissingColumn {
                    column: field.to_string(),
                    available: available.iter().map(|s| s.to_string()).collect(),
                })
            }
        }

        for field in &self.numeric_fields {
            require(field.as_str(), &available)?;
        }
        for step in &self.bins {
            require(step.source.as_str(), &available)?;
            available.insert(step.target.as_str());
        }
        if let Some(step) = &self.composite {
            if step.metrics.is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "composite '{}' lists no metrics",
                    step.name
                )));
            }
            for field in &step.metrics {
                require(field.as_str(), &available)?;
            }
            available.insert(step.name.as_str());
        }
        let rest = self
            .required_fields
            .iter()
            .chain(&self.group_fields)
            .chain(&self.metric_fields)
            .map(String::as_str)
            .chain(self.constraints.fields());
        for field in rest {
            require(field, &available)?;
        }
        Ok(())
    }

    /// Fields a record must carry to reach aggregation.  Group fields are
    /// exempt when missing keys form their own group.  A record missing any
    /// one metric is dropped for every metric, so all means cover the same
    /// respondents.
    fn completeness_fields(&self) -> Vec<String> {
        let groups: &[String] = if self.options.include_missing_keys {
            &[]
        } else {
            &self.group_fields
        };
        let mut fields: Vec<String> = Vec::new();
        for f in self
            .required_fields
            .iter()
            .chain(groups)
            .chain(&self.metric_fields)
        {
            if !fields.contains(f) {
                fields.push(f.clone());
            }
        }
        fields
    }

    /// Everything up to and including the filter: the records a view plots.
    pub fn prepare(&self, dataset: &Dataset) -> Result<Dataset> {
        self.validate(dataset)?;

        let mut ds = coerce_numeric(dataset, &self.numeric_fields)?;
        for step in &self.bins {
            ds = apply_bins(&ds, &step.source, &step.spec, &step.target)?;
        }
        if let Some(step) = &self.composite {
            ds = with_composite(&ds, &step.metrics, &step.name)?;
        }
        let ds = drop_incomplete(&ds, &self.completeness_fields())?;
        let ds = filter(&ds, &self.constraints)?;
        debug!("prepare: {} of {} record(s) survive", ds.len(), dataset.len());
        Ok(ds)
    }

    /// Run the whole pipeline and return summary rows.
    pub fn run(&self, dataset: &Dataset) -> Result<Vec<SummaryRow>> {
        let prepared = self.prepare(dataset)?;
        if prepared.is_empty() {
            info!("no records match the current filters");
            return Ok(Vec::new());
        }
        aggregate(&prepared, &self.group_fields, &self.metric_fields, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Constraint;
    use crate::data::model::{Record, Value};

    fn survey() -> Dataset {
        Dataset::from_records(vec![
            Record::new()
                .with("Age", "25")
                .with("Fav genre", "Rock")
                .with("Anxiety", "5")
                .with("Depression", "2"),
            Record::new()
                .with("Age", "25")
                .with("Fav genre", "Rock")
                .with("Anxiety", "7")
                .with("Depression", "N/A"),
            Record::new()
                .with("Age", "40")
                .with("Fav genre", "Jazz")
                .with("Anxiety", "3")
                .with("Depression", "9"),
        ])
    }

    fn genre_pipeline() -> Pipeline {
        Pipeline::new()
            .numeric(["Age", "Anxiety", "Depression"])
            .group_by(["Fav genre"])
            .metrics(["Anxiety"])
    }

    #[test]
    fn runs_coerce_group_and_mean() {
        let rows = genre_pipeline().run(&survey()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mean, 6.0);
        assert_eq!(rows[1].key(), vec![&Value::from("Jazz")]);
    }

    #[test]
    fn incomplete_metric_drops_record_for_all_metrics() {
        let rows = genre_pipeline()
            .metrics(["Anxiety", "Depression"])
            .run(&survey())
            .unwrap();
        // record 2 has Depression N/A, so it drops out before grouping
        assert_eq!(rows[0].mean, 5.0);
        assert_eq!(rows[1].mean, 2.0);
    }

    #[test]
    fn binned_group_field() {
        let rows = Pipeline::new()
            .numeric(["Age", "Anxiety"])
            .bin("Age", BinSpec::age_groups(), "Age group")
            .group_by(["Age group"])
            .metrics(["Anxiety"])
            .constrain(ConstraintSet::new().with(Constraint::equals("Age group", "40-49")))
            .run(&survey())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mean, 3.0);
    }

    #[test]
    fn composite_metric() {
        let rows = Pipeline::new()
            .numeric(["Anxiety", "Depression"])
            .composite("avg_score", ["Anxiety", "Depression"])
            .group_by(["Fav genre"])
            .metrics(["avg_score"])
            .run(&survey())
            .unwrap();
        // Rock: (5+2)/2 and 7 alone -> mean 5.25
        assert_eq!(rows[0].mean, 5.25);
        assert_eq!(rows[1].mean, 6.0);
    }

    #[test]
    fn empty_filter_result_is_not_an_error() {
        let rows = genre_pipeline()
            .constrain(ConstraintSet::new().with(Constraint::range("Age", 50.0, 60.0)))
            .run(&survey())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn schema_mismatch_stops_before_work() {
        let err = genre_pipeline()
            .group_by(["Country"])
            .run(&survey())
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { column, .. } if column == "Country"));
    }

    #[test]
    fn derived_field_usable_only_after_definition() {
        let p = Pipeline::new()
            .numeric(["Age group"])
            .bin("Age", BinSpec::age_groups(), "Age group");
        assert!(p.validate(&survey()).is_err());
    }

    #[test]
    fn missing_group_key_kept_on_request() {
        let mut ds = survey();
        ds.records[2].set("Fav genre", Value::Missing);
        let opts = AggregateOptions {
            include_missing_keys: true,
            ..Default::default()
        };
        let rows = genre_pipeline().options(opts).run(&ds).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].key(), vec![&Value::Missing]);

        let rows = genre_pipeline().run(&ds).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn input_dataset_is_not_mutated() {
        let ds = survey();
        let _ = genre_pipeline().run(&ds).unwrap();
        assert_eq!(ds, survey());
    }
}
