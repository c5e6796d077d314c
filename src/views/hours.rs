use crate::config::Config;
use crate::data::filter::ConstraintSet;
use crate::data::model::Dataset;
use crate::data::summary::SummaryTable;
use crate::error::Result;

use super::{base_pipeline, HOURS_BAND};

/// Mean of every score per daily listening band, in band order.
pub fn build(dataset: &Dataset, config: &Config, constraints: &ConstraintSet) -> Result<SummaryTable> {
    let metrics = &config.schema.metrics;
    let rows = base_pipeline(config, constraints)
        .group_by([HOURS_BAND])
        .metrics(metrics.clone())
        .run(dataset)?;

    SummaryTable::from_rows(&rows, &[HOURS_BAND.to_string()], metrics)
        .sort_by_bins(HOURS_BAND, &config.bins.hours_bands)
}
