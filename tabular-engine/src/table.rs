//! FILENAME: tabular-engine/src/table.rs
//! PURPOSE: The two-dimensional labelled result of a pivot.
//! CONTEXT: A `Table` has a multi-level row index, a multi-level column
//! index and one optional cell per (row, column). A `None` cell has no
//! underlying data and reads back as the table's fill value. Labels are
//! unique on each axis.

use std::fmt;
use std::iter;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::dataset::Dataset;
use crate::error::EngineError;
use crate::value::{compare_keys, format_key, AxisKey, BlankOrder, Key, Value};

/// Selects the row or the column index of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Rows,
    Columns,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Rows => f.write_str("row"),
            Axis::Columns => f.write_str("column"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    row_names: Vec<String>,
    column_names: Vec<String>,
    row_keys: Vec<AxisKey>,
    column_keys: Vec<AxisKey>,
    cells: Vec<Vec<Option<Value>>>,
    fill_value: Value,
}

impl Table {
    /// Creates a table without rows or columns.
    pub fn empty(row_names: Vec<String>, column_names: Vec<String>, fill_value: Value) -> Self {
        Table {
            row_names,
            column_names,
            fill_value,
            ..Default::default()
        }
    }

    /// Assembles a table, checking label widths, label uniqueness and the
    /// cell grid's shape.
    pub fn from_parts(
        row_names: Vec<String>,
        column_names: Vec<String>,
        row_keys: Vec<AxisKey>,
        column_keys: Vec<AxisKey>,
        cells: Vec<Vec<Option<Value>>>,
        fill_value: Value,
    ) -> Result<Self, EngineError> {
        check_labels(Axis::Rows, &row_names, &row_keys)?;
        check_labels(Axis::Columns, &column_names, &column_keys)?;

        let shape_ok = cells.len() == row_keys.len()
            && cells.iter().all(|row| row.len() == column_keys.len());
        if !shape_ok {
            return Err(EngineError::Shape {
                rows: row_keys.len(),
                columns: column_keys.len(),
            });
        }

        Ok(Table {
            row_names,
            column_names,
            row_keys,
            column_keys,
            cells,
            fill_value,
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn row_keys(&self) -> &[AxisKey] {
        &self.row_keys
    }

    pub fn column_keys(&self) -> &[AxisKey] {
        &self.column_keys
    }

    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.column_keys.is_empty()
    }

    pub fn fill_value(&self) -> &Value {
        &self.fill_value
    }

    pub fn row_position(&self, key: &[Key]) -> Option<usize> {
        self.row_keys.iter().position(|k| k.as_slice() == key)
    }

    pub fn column_position(&self, key: &[Key]) -> Option<usize> {
        self.column_keys.iter().position(|k| k.as_slice() == key)
    }

    /// The cell at a position, with empty cells reading as the fill value.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        let cell = self.cells.get(row)?.get(column)?;
        Some(cell.as_ref().unwrap_or(&self.fill_value))
    }

    /// The cell at a position, `None` when it has no underlying data.
    pub fn data(&self, row: usize, column: usize) -> Option<&Value> {
        self.cells.get(row)?.get(column)?.as_ref()
    }

    /// Looks a cell up by its row and column labels.
    pub fn get(&self, row_key: &[Key], column_key: &[Key]) -> Option<&Value> {
        let row = self.row_position(row_key)?;
        let column = self.column_position(column_key)?;
        self.cell(row, column)
    }

    // ========================================================================
    // RESHAPING
    // ========================================================================

    /// Swaps the row and column axes.
    pub fn transpose(&self) -> Table {
        let cells = (0..self.column_keys.len())
            .map(|c| self.cells.iter().map(|row| row[c].clone()).collect())
            .collect();

        Table {
            row_names: self.column_names.clone(),
            column_names: self.row_names.clone(),
            row_keys: self.column_keys.clone(),
            column_keys: self.row_keys.clone(),
            cells,
            fill_value: self.fill_value.clone(),
        }
    }

    /// Removes one level from an axis. Fails if labels stop being unique.
    pub fn drop_level(&self, axis: Axis, level: usize) -> Result<Table, EngineError> {
        let mut table = self.clone();
        let (names, keys) = table.axis_mut(axis);
        if level >= names.len() {
            return Err(EngineError::LevelOutOfRange {
                axis,
                level,
                levels: names.len(),
            });
        }

        names.remove(level);
        for key in keys.iter_mut() {
            key.remove(level);
        }
        check_labels(axis, names, keys)?;
        Ok(table)
    }

    /// Appends levels to an axis, every label taking `key` at each new level.
    pub fn extend_levels(mut self, axis: Axis, names: &[String], key: &Key) -> Table {
        let (level_names, keys) = self.axis_mut(axis);
        level_names.extend(names.iter().cloned());
        for label in keys.iter_mut() {
            label.extend(iter::repeat(key.clone()).take(names.len()));
        }
        self
    }

    /// Unpivots into long form: one record per cell with data, carrying the
    /// row levels, then the column levels, then `value_name`.
    /// Records are produced column by column.
    pub fn melt(&self, value_name: &str) -> Result<Dataset, EngineError> {
        let columns = self
            .row_names
            .iter()
            .chain(&self.column_names)
            .cloned()
            .chain(iter::once(value_name.to_string()));
        let mut dataset = Dataset::new(columns)?;

        for (c, column_key) in self.column_keys.iter().enumerate() {
            for (row_key, row) in self.row_keys.iter().zip(&self.cells) {
                let Some(value) = &row[c] else { continue };
                let record = row_key
                    .iter()
                    .chain(column_key.iter())
                    .map(Key::to_value)
                    .chain(iter::once(value.clone()))
                    .collect();
                dataset.push_row_with_markers(record)?;
            }
        }
        Ok(dataset)
    }

    /// Stacks tables sharing the same index level names.
    ///
    /// Columns are the union of all column labels, sorted with `order`.
    /// Rows are interleaved by their position inside their own table; among
    /// rows at the same position the earlier table comes first.
    pub fn concat(parts: Vec<Table>, order: BlankOrder) -> Result<Table, EngineError> {
        let Some(first) = parts.first() else {
            return Ok(Table::default());
        };
        let row_names = first.row_names.clone();
        let column_names = first.column_names.clone();
        let fill_value = first.fill_value.clone();

        for part in &parts[1..] {
            check_same_levels(Axis::Rows, &row_names, &part.row_names)?;
            check_same_levels(Axis::Columns, &column_names, &part.column_names)?;
        }

        let mut column_keys: Vec<AxisKey> = Vec::new();
        let mut column_index: FxHashMap<AxisKey, usize> = FxHashMap::default();
        for key in parts.iter().flat_map(|p| &p.column_keys) {
            if !column_index.contains_key(key) {
                column_index.insert(key.clone(), column_keys.len());
                column_keys.push(key.clone());
            }
        }

        let mut tagged: Vec<(usize, AxisKey, Vec<Option<Value>>)> = Vec::new();
        for part in parts {
            let Table {
                row_keys,
                column_keys: part_columns,
                cells,
                ..
            } = part;
            for (position, (key, row)) in row_keys.into_iter().zip(cells).enumerate() {
                let mut aligned = vec![None; column_keys.len()];
                for (cell, column_key) in row.into_iter().zip(&part_columns) {
                    aligned[column_index[column_key]] = cell;
                }
                tagged.push((position, key, aligned));
            }
        }
        // Stable: parts keep their concatenation order within one position.
        tagged.sort_by_key(|(position, _, _)| *position);

        let (row_keys, cells): (Vec<AxisKey>, Vec<Vec<Option<Value>>>) =
            tagged.into_iter().map(|(_, key, row)| (key, row)).unzip();
        let mut table = Table::from_parts(row_names, column_names, row_keys, column_keys, cells, fill_value)?;
        table.sort_columns(order);
        Ok(table)
    }

    /// Adds the columns of `other`, matching rows by label. Rows only
    /// `other` has are appended.
    pub fn merge_columns(self, other: Table) -> Result<Table, EngineError> {
        check_same_levels(Axis::Rows, &self.row_names, &other.row_names)?;
        check_same_levels(Axis::Columns, &self.column_names, &other.column_names)?;

        let Table {
            row_names,
            column_names,
            mut row_keys,
            mut column_keys,
            mut cells,
            fill_value,
        } = self;

        let offset = column_keys.len();
        column_keys.extend(other.column_keys.iter().cloned());
        let width = column_keys.len();
        for row in cells.iter_mut() {
            row.resize(width, None);
        }

        let mut positions: FxHashMap<AxisKey, usize> = row_keys
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, key)| (key, i))
            .collect();

        for (key, row) in other.row_keys.into_iter().zip(other.cells) {
            let r = match positions.get(&key).copied() {
                Some(r) => r,
                None => {
                    row_keys.push(key.clone());
                    cells.push(vec![None; width]);
                    positions.insert(key, row_keys.len() - 1);
                    row_keys.len() - 1
                }
            };
            for (c, cell) in row.into_iter().enumerate() {
                cells[r][offset + c] = cell;
            }
        }

        Table::from_parts(row_names, column_names, row_keys, column_keys, cells, fill_value)
    }

    // ========================================================================
    // SORTING
    // ========================================================================

    /// Sorts rows by label, lexicographically by level.
    pub fn sort_rows(&mut self, order: BlankOrder) {
        let permutation = sorted_permutation(&self.row_keys, order);
        let row_keys = permutation.iter().map(|&i| self.row_keys[i].clone()).collect();
        let cells = permutation
            .iter()
            .map(|&i| std::mem::take(&mut self.cells[i]))
            .collect();
        self.row_keys = row_keys;
        self.cells = cells;
    }

    /// Sorts columns by label, lexicographically by level.
    pub fn sort_columns(&mut self, order: BlankOrder) {
        let permutation = sorted_permutation(&self.column_keys, order);
        self.column_keys = permutation.iter().map(|&i| self.column_keys[i].clone()).collect();
        for row in self.cells.iter_mut() {
            let mut old = std::mem::take(row);
            *row = permutation.iter().map(|&i| old[i].take()).collect();
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> (&mut Vec<String>, &mut Vec<AxisKey>) {
        match axis {
            Axis::Rows => (&mut self.row_names, &mut self.row_keys),
            Axis::Columns => (&mut self.column_names, &mut self.column_keys),
        }
    }
}

fn sorted_permutation(keys: &[AxisKey], order: BlankOrder) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..keys.len()).collect();
    permutation.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], order));
    permutation
}

fn check_labels(axis: Axis, names: &[String], keys: &[AxisKey]) -> Result<(), EngineError> {
    let mut seen = FxHashSet::default();
    for key in keys {
        if key.len() != names.len() {
            return Err(EngineError::KeyWidth {
                axis,
                expected: names.len(),
                found: key.len(),
            });
        }
        if !seen.insert(key) {
            return Err(EngineError::DuplicateLabel {
                axis,
                label: format_key(key),
            });
        }
    }
    Ok(())
}

fn check_same_levels(axis: Axis, expected: &[String], found: &[String]) -> Result<(), EngineError> {
    if expected == found {
        Ok(())
    } else {
        Err(EngineError::LevelMismatch {
            axis,
            expected: expected.join(", "),
            found: found.join(", "),
        })
    }
}
