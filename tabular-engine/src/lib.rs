//! FILENAME: tabular-engine/src/lib.rs
//! In-memory tabular core for subtotal pivots.
//!
//! Layers:
//! - `value`: Scalars, index keys and their ordering
//! - `dataset`: The record-oriented input (WHAT we aggregate)
//! - `aggregate`: Reductions applied to each group
//! - `table`: The labelled two-axis result and its reshaping operations
//! - `pivot`: The grouping primitive (HOW we aggregate)

pub mod aggregate;
pub mod dataset;
pub mod error;
pub mod pivot;
pub mod table;
pub mod value;

pub use aggregate::{AggregateAccumulator, AggregateError, AggregationType, Aggregator, Reduce, TryReduce};
pub use dataset::Dataset;
pub use error::EngineError;
pub use pivot::pivot_table;
pub use table::{Axis, Table};
pub use value::{compare_key, compare_keys, format_key, AxisKey, BlankOrder, Key, OrderedFloat, Value};
