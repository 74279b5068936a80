//! FILENAME: subtotal-pivot/src/definition.rs
//! PURPOSE: Serializable description of a subtotal pivot.
//! CONTEXT: Everything needed to rerun a pivot lives here, so a definition
//! can be stored as JSON next to the data it summarizes.

use serde::{Deserialize, Serialize};
use tabular_engine::{AggregationType, BlankOrder, Dataset, Table, Value};

use crate::engine::{pivot_with_full_subtotals, pivot_with_row_subtotals, standard_pivot};
use crate::error::PivotError;

// ============================================================================
// OPTIONS
// ============================================================================

/// Where a subtotal sits relative to the rows or columns it summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SubtotalLocation {
    /// Subtotal before its children; the grand total comes first (default).
    #[default]
    AtTop,
    /// Subtotal after its last child; the grand total comes last.
    AtBottom,
}

impl SubtotalLocation {
    pub fn blank_order(self) -> BlankOrder {
        match self {
            SubtotalLocation::AtTop => BlankOrder::First,
            SubtotalLocation::AtBottom => BlankOrder::Last,
        }
    }
}

/// Names and markers used by the full-subtotal pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelNames {
    /// Synthetic top row level that yields the row grand total.
    #[serde(default = "default_all_rows")]
    pub all_rows: String,

    /// Synthetic top column level that yields the column grand total.
    #[serde(default = "default_all_cols")]
    pub all_cols: String,

    /// Replaces missing keys before grouping.
    #[serde(default = "default_missing_key")]
    pub missing_key: Value,
}

fn default_all_rows() -> String {
    "All_rows".to_string()
}

fn default_all_cols() -> String {
    "All_cols".to_string()
}

fn default_missing_key() -> Value {
    Value::Text("-".to_string())
}

impl Default for SentinelNames {
    fn default() -> Self {
        SentinelNames {
            all_rows: default_all_rows(),
            all_cols: default_all_cols(),
            missing_key: default_missing_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubtotalOptions {
    /// Shown for combinations without data. Missing by default.
    #[serde(default)]
    pub fill_value: Value,

    #[serde(default)]
    pub subtotal_location: SubtotalLocation,

    /// Adds a grand-total row and a total column to row-subtotal pivots.
    /// Full-subtotal pivots always carry their totals.
    #[serde(default)]
    pub include_margins: bool,

    #[serde(default)]
    pub sentinels: SentinelNames,
}

// ============================================================================
// DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtotalMode {
    /// Subtotal rows at every depth of the row hierarchy.
    #[default]
    RowSubtotals,
    /// Subtotals on both axes plus grand totals.
    FullSubtotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtotalDefinition {
    /// The column that is aggregated.
    pub value_field: String,

    /// Row hierarchy, outermost level first.
    pub row_fields: Vec<String>,

    /// Column hierarchy, outermost level first.
    #[serde(default)]
    pub column_fields: Vec<String>,

    #[serde(default)]
    pub aggregation: AggregationType,

    #[serde(default)]
    pub mode: SubtotalMode,

    #[serde(default)]
    pub options: SubtotalOptions,
}

impl SubtotalDefinition {
    /// Creates a row-subtotal sum of `value_field` with default options.
    pub fn new(value_field: impl Into<String>, row_fields: Vec<String>) -> Self {
        SubtotalDefinition {
            value_field: value_field.into(),
            row_fields,
            column_fields: Vec::new(),
            aggregation: AggregationType::default(),
            mode: SubtotalMode::default(),
            options: SubtotalOptions::default(),
        }
    }

    pub fn with_columns(mut self, column_fields: Vec<String>) -> Self {
        self.column_fields = column_fields;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationType) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_mode(mut self, mode: SubtotalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Computes the pivot this definition describes.
    pub fn calculate(&self, dataset: &Dataset) -> Result<Table, PivotError> {
        match self.mode {
            SubtotalMode::RowSubtotals => pivot_with_row_subtotals(
                dataset,
                &self.value_field,
                &self.row_fields,
                &self.column_fields,
                &self.aggregation,
                &self.options,
            ),
            SubtotalMode::FullSubtotals => pivot_with_full_subtotals(
                dataset,
                &self.value_field,
                &self.row_fields,
                &self.column_fields,
                &self.aggregation,
                &self.options,
            ),
        }
    }

    /// Computes the same pivot without any subtotals.
    pub fn standard(&self, dataset: &Dataset) -> Result<Table, PivotError> {
        standard_pivot(
            dataset,
            &self.value_field,
            &self.row_fields,
            &self.column_fields,
            &self.aggregation,
            &self.options,
        )
    }
}
