/// Presentation adapters: each view is one parameterised [`Pipeline`] plus
/// the table shaping its chart expects.
///
/// ```text
///   Dataset ──► base pipeline (coerce, age groups, constraints)
///                   │
///        ┌──────────┼──────────┬──────────┬──────────┐
///        ▼          ▼          ▼          ▼          ▼
///      genre       age       hours     heatmap    scatter
///        └──────────┴─────┬────┴──────────┴──────────┘
///                         ▼
///                    SummaryTable
/// ```

pub mod age;
pub mod genre;
pub mod heatmap;
pub mod hours;
pub mod scatter;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::data::filter::ConstraintSet;
use crate::data::model::Dataset;
use crate::data::summary::SummaryTable;
use crate::error::Result;
use crate::pipeline::Pipeline;

/// Derived column holding the age-group label of every record.
pub const AGE_GROUP: &str = "Age group";

/// Derived column holding the listening-time band of every record.
pub const HOURS_BAND: &str = "Hours band";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Mean scores per favourite genre, with a combined `avg_score`.
    #[default]
    Genre,
    /// Mean scores per age group.
    Age,
    /// Mean scores per daily listening band.
    Hours,
    /// One score over an age × hours grid.
    Heatmap,
    /// Filtered respondents as (age, hours, score) points.
    Scatter,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Genre => "genre",
            View::Age => "age",
            View::Hours => "hours",
            View::Heatmap => "heatmap",
            View::Scatter => "scatter",
        };
        write!(f, "{name}")
    }
}

/// Shared front half of every view: numeric coercion of the schema
/// columns, age-group and hours-band labels, then the caller's constraints.
pub fn base_pipeline(config: &Config, constraints: &ConstraintSet) -> Pipeline {
    let schema = &config.schema;
    Pipeline::new()
        .numeric([schema.age.clone(), schema.hours.clone()])
        .numeric(config.all_metrics())
        .bin(&schema.age, config.bins.age_groups.clone(), AGE_GROUP)
        .bin(&schema.hours, config.bins.hours_bands.clone(), HOURS_BAND)
        .constrain(constraints.clone())
}

/// Build the table for `view` from the original dataset.
pub fn render(
    view: View,
    dataset: &Dataset,
    config: &Config,
    constraints: &ConstraintSet,
) -> Result<SummaryTable> {
    match view {
        View::Genre => genre::build(dataset, config, constraints),
        View::Age => age::build(dataset, config, constraints),
        View::Hours => hours::build(dataset, config, constraints),
        View::Heatmap => heatmap::build(dataset, config, constraints),
        View::Scatter => scatter::build(dataset, config, constraints),
    }
}
