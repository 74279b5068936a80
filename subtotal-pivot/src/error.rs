//! FILENAME: subtotal-pivot/src/error.rs

use tabular_engine::{AggregateError, EngineError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    /// A requested field is absent or the level hierarchy is malformed.
    #[error("invalid {axis} configuration: {message}")]
    Configuration { axis: String, message: String },

    /// The long/wide round trip could not rebuild a consistent index.
    #[error("reshape failed: {0}")]
    Reshape(String),

    #[error(transparent)]
    Aggregation(#[from] AggregateError),
}

impl PivotError {
    pub(crate) fn configuration(axis: &str, message: impl Into<String>) -> Self {
        PivotError::Configuration {
            axis: axis.to_string(),
            message: message.into(),
        }
    }
}

impl From<EngineError> for PivotError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownColumn(name) => {
                PivotError::configuration("dataset", format!("column '{}' not found", name))
            }
            EngineError::Aggregate(inner) => PivotError::Aggregation(inner),
            other => PivotError::Reshape(other.to_string()),
        }
    }
}
