use crate::config::Config;
use crate::data::filter::ConstraintSet;
use crate::data::model::Dataset;
use crate::data::summary::SummaryTable;
use crate::error::Result;

use super::{base_pipeline, AGE_GROUP};

/// Mean of every score per age group, in bin order.
pub fn build(dataset: &Dataset, config: &Config, constraints: &ConstraintSet) -> Result<SummaryTable> {
    let metrics = &config.schema.metrics;
    let rows = base_pipeline(config, constraints)
        .group_by([AGE_GROUP])
        .metrics(metrics.clone())
        .run(dataset)?;

    SummaryTable::from_rows(&rows, &[AGE_GROUP.to_string()], metrics)
        .sort_by_bins(AGE_GROUP, &config.bins.age_groups)
}
