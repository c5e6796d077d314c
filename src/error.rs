use thiserror::Error;

/// Conditions the pipeline escalates to its caller.
///
/// Missing values and empty results are not errors; they travel as
/// [`Value::Missing`](crate::data::model::Value::Missing) and as empty
/// summaries respectively.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("invalid bin spec: {0}")]
    InvalidBins(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
