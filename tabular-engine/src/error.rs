//! FILENAME: tabular-engine/src/error.rs

use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::table::Axis;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column '{column}': the blank subtotal marker is not a data value")]
    ReservedBlank { row: usize, column: String },

    #[error("table shape mismatch: expected {rows} rows of {columns} cells")]
    Shape { rows: usize, columns: usize },

    #[error("{axis} label has {found} levels, expected {expected}")]
    KeyWidth {
        axis: Axis,
        expected: usize,
        found: usize,
    },

    #[error("duplicate {axis} label: {label}")]
    DuplicateLabel { axis: Axis, label: String },

    #[error("{axis} index has {levels} levels, no level {level}")]
    LevelOutOfRange {
        axis: Axis,
        level: usize,
        levels: usize,
    },

    #[error("{axis} index levels differ: expected [{expected}], found [{found}]")]
    LevelMismatch {
        axis: Axis,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
