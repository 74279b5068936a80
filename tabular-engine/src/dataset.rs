//! FILENAME: tabular-engine/src/dataset.rs
//! PURPOSE: The rectangular source data a pivot is computed from.
//! CONTEXT: An ordered list of records sharing one set of named columns.
//! Rows are stored positionally; every row is exactly as wide as the header.

use rustc_hash::FxHashSet;

use crate::error::EngineError;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Creates an empty dataset with the given column names.
    pub fn new<I, S>(columns: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = FxHashSet::default();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(EngineError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Dataset {
            columns,
            rows: Vec::new(),
        })
    }

    /// Creates a dataset from a header and positional rows.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Dataset::new(columns)?;
        dataset.rows.reserve(rows.len());
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Creates a dataset from name/value records.
    /// Columns appear in first-seen order; fields a record lacks are missing.
    pub fn from_records<I, R, K, V>(records: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let records: Vec<Vec<(String, Value)>> = records
            .into_iter()
            .map(|r| r.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
            .collect();

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for (name, _) in record {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let mut dataset = Dataset::new(columns)?;
        for record in records {
            let mut row = vec![Value::Missing; dataset.columns.len()];
            let mut filled = vec![false; dataset.columns.len()];
            for (name, value) in record {
                let position = dataset.require_column(&name)?;
                if filled[position] {
                    return Err(EngineError::DuplicateColumn(name));
                }
                filled[position] = true;
                row[position] = value;
            }
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Appends a row. Its width must match the header, and it may not hold
    /// the subtotal marker `Value::Blank`.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), EngineError> {
        if let Some(position) = row.iter().position(Value::is_blank) {
            return Err(EngineError::ReservedBlank {
                row: self.rows.len(),
                column: self.columns.get(position).cloned().unwrap_or_default(),
            });
        }
        self.push_row_with_markers(row)
    }

    /// Appends a row that may carry subtotal markers. Used for long forms
    /// derived from tables and subtotal records.
    pub(crate) fn push_row_with_markers(&mut self, row: Vec<Value>) -> Result<(), EngineError> {
        if row.len() != self.columns.len() {
            return Err(EngineError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    /// Like `column_position`, but an absent column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize, EngineError> {
        self.column_position(name)
            .ok_or_else(|| EngineError::UnknownColumn(name.to_string()))
    }

    /// Iterates over one column's values in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_, EngineError> {
        let position = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[position]))
    }

    /// Adds a column holding the same value in every row.
    pub fn add_constant_column(&mut self, name: impl Into<String>, value: Value) -> Result<(), EngineError> {
        let name = name.into();
        if self.contains_column(&name) {
            return Err(EngineError::DuplicateColumn(name));
        }
        if value.is_blank() {
            return Err(EngineError::ReservedBlank { row: 0, column: name });
        }
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(value.clone());
        }
        Ok(())
    }

    /// Replaces missing values with `replacement`, leaving the columns named
    /// in `keep` untouched.
    pub fn fill_missing(&mut self, replacement: &Value, keep: &[&str]) {
        let targets: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !keep.contains(&self.columns[i].as_str()))
            .collect();
        for row in &mut self.rows {
            for &i in &targets {
                if row[i].is_missing() {
                    row[i] = replacement.clone();
                }
            }
        }
    }

    /// Repeats every record once per prefix of `levels`, shallowest first.
    ///
    /// The copy for prefix depth `d` keeps the first `d` levels and holds
    /// `Value::Blank` in the rest, so grouping the result by all of `levels`
    /// yields every subtotal group with each source record counted once per
    /// group. The deepest copy is the record itself.
    pub fn subtotal_records<S: AsRef<str>>(&self, levels: &[S]) -> Result<Dataset, EngineError> {
        let positions = levels
            .iter()
            .map(|level| self.require_column(level.as_ref()))
            .collect::<Result<Vec<usize>, _>>()?;

        let mut expanded = Dataset {
            columns: self.columns.clone(),
            rows: Vec::with_capacity(self.rows.len() * positions.len()),
        };
        for depth in 1..=positions.len() {
            for row in &self.rows {
                let mut copy = row.clone();
                for &p in &positions[depth..] {
                    copy[p] = Value::Blank;
                }
                expanded.rows.push(copy);
            }
        }

        log::debug!(
            "[PIVOT] subtotal_records levels={} records={} expanded={}",
            positions.len(),
            self.rows.len(),
            expanded.rows.len()
        );
        Ok(expanded)
    }
}
