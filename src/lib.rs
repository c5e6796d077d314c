//! Filter, bin and aggregate the music & mental-health survey.
//!
//! Load a [`Dataset`] once, describe a view as a [`Pipeline`] (or use the
//! prebuilt [`views`]), and run it whenever the filters change.

pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod views;

pub use data::aggregate::{aggregate, compose_score, AggregateOptions, GroupOrder, SummaryRow};
pub use data::bins::{assign_bin, BinSpec};
pub use data::clean::{coerce_numeric, drop_incomplete};
pub use data::filter::{filter, Constraint, ConstraintSet};
pub use data::model::{Dataset, Record, Value};
pub use data::summary::SummaryTable;
pub use error::{PipelineError, Result};
pub use pipeline::Pipeline;
pub use session::Session;
