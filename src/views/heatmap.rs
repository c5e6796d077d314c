use log::debug;

use crate::config::Config;
use crate::data::bins::BinSpec;
use crate::data::filter::ConstraintSet;
use crate::data::model::Dataset;
use crate::data::summary::SummaryTable;
use crate::error::Result;

use super::base_pipeline;

pub const AGE_BIN: &str = "Age bin";
pub const HOURS_BIN: &str = "Hours bin";

/// Equal-width bins over the observed span of a column.
fn span_bins(dataset: &Dataset, column: &str, n: usize) -> Result<Option<BinSpec>> {
    dataset.require_columns(&[column])?;
    match dataset.numeric_span(column) {
        None => Ok(None),
        // a single distinct value still needs a non-empty interval
        Some((lo, hi)) if lo == hi => BinSpec::uniform(lo, lo + 1.0, n).map(Some),
        Some((lo, hi)) => BinSpec::uniform(lo, hi, n).map(Some),
    }
}

/// Mean of the default metric over an age × hours grid.  Cells with no
/// respondents are absent.  Rows run age-major in bin order.
pub fn build(dataset: &Dataset, config: &Config, constraints: &ConstraintSet) -> Result<SummaryTable> {
    let schema = &config.schema;
    let metric = config.defaults.metric.clone();
    let group = [AGE_BIN.to_string(), HOURS_BIN.to_string()];

    let pipeline = base_pipeline(config, constraints)
        .require([schema.age.clone(), schema.hours.clone()])
        .metrics([metric.clone()]);
    // the grid spans what survives the filters, not the whole survey
    let visible = pipeline.prepare(dataset)?;
    let age_spec = span_bins(&visible, &schema.age, config.bins.heatmap_age_bins)?;
    let hours_spec = span_bins(&visible, &schema.hours, config.bins.heatmap_hours_bins)?;
    let (Some(age_spec), Some(hours_spec)) = (age_spec, hours_spec) else {
        debug!("heatmap: no numeric age/hours values");
        return Ok(SummaryTable::from_rows(&[], &group, &[metric]));
    };

    let rows = pipeline
        .bin(&schema.age, age_spec.clone(), AGE_BIN)
        .bin(&schema.hours, hours_spec.clone(), HOURS_BIN)
        .group_by(group.clone())
        .run(dataset)?;

    SummaryTable::from_rows(&rows, &group, &[metric])
        .sort_by_bins(HOURS_BIN, &hours_spec)?
        .sort_by_bins(AGE_BIN, &age_spec)
}
