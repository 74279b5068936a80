//! FILENAME: tabular-engine/src/pivot.rs
//! PURPOSE: Group records by index and column keys and reduce each group.
//! CONTEXT: This is the single aggregation primitive the subtotal layers are
//! built from. It knows nothing about subtotals: a `Blank` key is grouped
//! like any other key, and only `Missing` keys are excluded.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::aggregate::Aggregator;
use crate::dataset::Dataset;
use crate::error::EngineError;
use crate::table::Table;
use crate::value::{compare_keys, AxisKey, BlankOrder, Key, Value};

/// Computes a pivot of `values` with rows grouped by `index` and columns
/// grouped by `columns`.
///
/// Records whose key is missing in any used level are left out. Rows and
/// columns are the observed keys sorted with `order`. Cells whose group is
/// empty, or whose aggregate is missing, have no data and read as
/// `fill_value`.
pub fn pivot_table<S: AsRef<str>>(
    dataset: &Dataset,
    values: &str,
    index: &[S],
    columns: &[S],
    aggregator: &dyn Aggregator,
    fill_value: &Value,
    order: BlankOrder,
) -> Result<Table, EngineError> {
    let value_position = dataset.require_column(values)?;
    let index_positions = resolve(dataset, index)?;
    let column_positions = resolve(dataset, columns)?;

    // Group: (row key, column key) -> values
    let mut groups: FxHashMap<(AxisKey, AxisKey), Vec<Value>> = FxHashMap::default();
    let mut skipped = 0usize;
    for record in dataset.rows() {
        let (Some(row_key), Some(column_key)) = (
            project(record, &index_positions),
            project(record, &column_positions),
        ) else {
            skipped += 1;
            continue;
        };
        groups
            .entry((row_key, column_key))
            .or_default()
            .push(record[value_position].clone());
    }

    let row_keys = distinct_sorted(groups.keys().map(|(r, _)| r), order);
    let column_keys = distinct_sorted(groups.keys().map(|(_, c)| c), order);

    let row_lookup = positions(&row_keys);
    let column_lookup = positions(&column_keys);
    let mut cells = vec![vec![None; column_keys.len()]; row_keys.len()];
    for ((row_key, column_key), group) in &groups {
        let result = aggregator.aggregate(group)?;
        if !result.is_missing() {
            cells[row_lookup[row_key]][column_lookup[column_key]] = Some(result);
        }
    }

    log::debug!(
        "[PIVOT] pivot_table index=[{}] columns=[{}] groups={} rows={} cols={} skipped={}",
        join(index),
        join(columns),
        groups.len(),
        row_keys.len(),
        column_keys.len(),
        skipped
    );

    Table::from_parts(
        names(index),
        names(columns),
        row_keys,
        column_keys,
        cells,
        fill_value.clone(),
    )
}

fn resolve<S: AsRef<str>>(dataset: &Dataset, levels: &[S]) -> Result<Vec<usize>, EngineError> {
    levels
        .iter()
        .map(|level| dataset.require_column(level.as_ref()))
        .collect()
}

fn project(record: &[Value], positions: &[usize]) -> Option<AxisKey> {
    positions
        .iter()
        .map(|&p| Key::from_value(&record[p]))
        .collect()
}

fn distinct_sorted<'a>(keys: impl Iterator<Item = &'a AxisKey>, order: BlankOrder) -> Vec<AxisKey> {
    let unique: FxHashSet<&AxisKey> = keys.collect();
    let mut sorted: Vec<AxisKey> = unique.into_iter().cloned().collect();
    sorted.sort_by(|a, b| compare_keys(a, b, order));
    sorted
}

fn positions(keys: &[AxisKey]) -> FxHashMap<&AxisKey, usize> {
    keys.iter().enumerate().map(|(i, k)| (k, i)).collect()
}

fn names<S: AsRef<str>>(levels: &[S]) -> Vec<String> {
    levels.iter().map(|l| l.as_ref().to_string()).collect()
}

fn join<S: AsRef<str>>(levels: &[S]) -> String {
    names(levels).join(", ")
}
