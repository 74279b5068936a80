//! FILENAME: subtotal-pivot/src/lib.rs
//! Hierarchical subtotal pivots.
//!
//! Built on `tabular-engine`'s plain pivot. Subtotal rows and columns are
//! ordinary table entries whose keys hold the blank marker in the levels they
//! do not group on.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `engine`: Row-subtotal and full-subtotal computations (HOW we calculate)
//! - `error`: Configuration, reshape and aggregation failures

pub mod definition;
pub mod engine;
pub mod error;

pub use definition::*;
pub use engine::{pivot_with_full_subtotals, pivot_with_row_subtotals, standard_pivot};
pub use error::PivotError;
