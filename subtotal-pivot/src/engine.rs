//! FILENAME: subtotal-pivot/src/engine.rs
//! PURPOSE: Subtotal pivots built from repeated plain pivots.
//! CONTEXT: A row-subtotal pivot stacks one plain pivot per prefix of the row
//! hierarchy, padding the levels not grouped on with the blank marker. The
//! full-subtotal pivot expands the records into one copy per row prefix, runs
//! the row-subtotal pivot over that long form with the axes swapped, then
//! transposes. Synthetic single-valued top levels provide the grand totals.

use rustc_hash::FxHashSet;
use tabular_engine::{pivot_table, Aggregator, Axis, BlankOrder, Dataset, Key, Table, Value};

use crate::definition::SubtotalOptions;
use crate::error::PivotError;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Pivots `value_column` with a subtotal row for every prefix of
/// `row_levels`, crossed with the full `column_levels` hierarchy.
///
/// Subtotal rows carry `Key::Blank` in the levels they do not group on.
/// With `options.include_margins` an all-blank grand-total row is added, and
/// an all-blank total column when there are column levels.
pub fn pivot_with_row_subtotals<S: AsRef<str>>(
    dataset: &Dataset,
    value_column: &str,
    row_levels: &[S],
    column_levels: &[S],
    aggregator: &dyn Aggregator,
    options: &SubtotalOptions,
) -> Result<Table, PivotError> {
    let rows = owned(row_levels);
    let columns = owned(column_levels);
    validate(dataset, value_column, &rows, &columns)?;

    let table = row_subtotals(
        dataset,
        value_column,
        &rows,
        &columns,
        aggregator,
        &options.fill_value,
        options.subtotal_location.blank_order(),
        options.include_margins,
    )?;

    log::info!(
        "[PIVOT] row subtotals value={} rows={} cols={}",
        value_column,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Pivots `value_column` with subtotals at every depth of both hierarchies
/// and a grand-total row and column.
///
/// Missing values outside `value_column` are replaced with
/// `options.sentinels.missing_key` first, so absent categories form their own
/// group. `options.include_margins` is ignored: totals are always present.
pub fn pivot_with_full_subtotals<S: AsRef<str>>(
    dataset: &Dataset,
    value_column: &str,
    row_levels: &[S],
    column_levels: &[S],
    aggregator: &dyn Aggregator,
    options: &SubtotalOptions,
) -> Result<Table, PivotError> {
    let rows = owned(row_levels);
    let columns = owned(column_levels);
    let sentinels = &options.sentinels;
    validate(dataset, value_column, &rows, &columns)?;

    for (axis, name) in [("row", &sentinels.all_rows), ("column", &sentinels.all_cols)] {
        if dataset.contains_column(name) {
            return Err(PivotError::configuration(
                axis,
                format!("dataset already has a column named like the total level '{}'", name),
            ));
        }
    }
    if sentinels.all_rows == sentinels.all_cols {
        return Err(PivotError::configuration(
            "row",
            format!("row and column total levels share the name '{}'", sentinels.all_rows),
        ));
    }
    if sentinels.missing_key.is_blank() {
        return Err(PivotError::configuration(
            "dataset",
            "the blank subtotal marker cannot stand in for missing keys",
        ));
    }

    let fill_value = &options.fill_value;
    let order = options.subtotal_location.blank_order();
    let sentinel = Value::Number(0.0);

    // Prepare
    let mut working = dataset.clone();
    working.fill_missing(&sentinels.missing_key, &[value_column]);
    working.add_constant_column(sentinels.all_cols.clone(), sentinel.clone())?;
    working.add_constant_column(sentinels.all_rows.clone(), sentinel)?;

    let total_rows = prefixed(&sentinels.all_rows, &rows);
    let total_columns = prefixed(&sentinels.all_cols, &columns);

    // Long form: each record once per row prefix, deeper levels blanked
    let long = working.subtotal_records(&total_rows)?;
    log::debug!(
        "[PIVOT] full subtotals long form records={} from={}",
        long.len(),
        working.len()
    );

    // Row-subtotal pass with the axes swapped; each cell reduces source values
    let swapped = row_subtotals(
        &long,
        value_column,
        &total_columns,
        &total_rows,
        aggregator,
        fill_value,
        order,
        false,
    )?;
    log::debug!(
        "[PIVOT] full subtotals swapped pass rows={} cols={}",
        swapped.row_count(),
        swapped.column_count()
    );

    let table = swapped
        .transpose()
        .drop_level(Axis::Rows, 0)?
        .drop_level(Axis::Columns, 0)?;

    log::info!(
        "[PIVOT] full subtotals value={} rows={} cols={}",
        value_column,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Pivots `value_column` by the full row and column hierarchies, without
/// subtotals.
pub fn standard_pivot<S: AsRef<str>>(
    dataset: &Dataset,
    value_column: &str,
    row_levels: &[S],
    column_levels: &[S],
    aggregator: &dyn Aggregator,
    options: &SubtotalOptions,
) -> Result<Table, PivotError> {
    let rows = owned(row_levels);
    let columns = owned(column_levels);
    validate(dataset, value_column, &rows, &columns)?;

    let table = pivot_table(
        dataset,
        value_column,
        &rows,
        &columns,
        aggregator,
        &options.fill_value,
        options.subtotal_location.blank_order(),
    )?;
    log::info!(
        "[PIVOT] standard value={} rows={} cols={}",
        value_column,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

// ============================================================================
// ROW SUBTOTALS
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn row_subtotals(
    dataset: &Dataset,
    value_column: &str,
    rows: &[String],
    columns: &[String],
    aggregator: &dyn Aggregator,
    fill_value: &Value,
    order: BlankOrder,
    margins: bool,
) -> Result<Table, PivotError> {
    let first_depth = if margins { 0 } else { 1 };
    let mut parts = Vec::with_capacity(rows.len() + 1);

    for depth in first_depth..=rows.len() {
        let index = &rows[..depth];
        let mut table = pivot_table(dataset, value_column, index, columns, aggregator, fill_value, order)?;

        if margins && !columns.is_empty() {
            let no_columns: &[String] = &[];
            let totals = pivot_table(dataset, value_column, index, no_columns, aggregator, fill_value, order)?
                .extend_levels(Axis::Columns, columns, &Key::Blank);
            table = table.merge_columns(totals)?;
        }

        log::debug!(
            "[PIVOT] subtotal depth={} index=[{}] rows={} cols={}",
            depth,
            index.join(", "),
            table.row_count(),
            table.column_count()
        );
        parts.push(table.extend_levels(Axis::Rows, &rows[depth..], &Key::Blank));
    }

    let mut combined = Table::concat(parts, order)?;
    combined.sort_rows(order);
    Ok(combined)
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate(
    dataset: &Dataset,
    value_column: &str,
    rows: &[String],
    columns: &[String],
) -> Result<(), PivotError> {
    if rows.is_empty() {
        return Err(PivotError::configuration("row", "at least one row level is required"));
    }
    if !dataset.contains_column(value_column) {
        return Err(PivotError::configuration(
            "value",
            format!("column '{}' not found in dataset", value_column),
        ));
    }

    let mut seen = FxHashSet::default();
    for (axis, levels) in [("row", rows), ("column", columns)] {
        for level in levels {
            if !dataset.contains_column(level) {
                return Err(PivotError::configuration(
                    axis,
                    format!("column '{}' not found in dataset", level),
                ));
            }
            if level == value_column {
                return Err(PivotError::configuration(
                    axis,
                    format!("'{}' is both a grouping level and the value column", level),
                ));
            }
            if !seen.insert(level.as_str()) {
                return Err(PivotError::configuration(
                    axis,
                    format!("level '{}' is used more than once", level),
                ));
            }
        }
    }
    Ok(())
}

fn owned<S: AsRef<str>>(levels: &[S]) -> Vec<String> {
    levels.iter().map(|l| l.as_ref().to_string()).collect()
}

fn prefixed(first: &str, rest: &[String]) -> Vec<String> {
    std::iter::once(first.to_string()).chain(rest.iter().cloned()).collect()
}
