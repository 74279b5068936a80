//! FILENAME: persistence/src/lib.rs
//! Spreadsheet persistence for pivot inputs and results.
//!
//! Reads source datasets from XLSX files and writes pivot tables back out,
//! one table per worksheet.

mod error;
mod xlsx_reader;
mod xlsx_writer;

pub use error::PersistenceError;
pub use xlsx_reader::{load_dataset, load_xlsx};
pub use xlsx_writer::save_xlsx;

use std::collections::HashMap;

use tabular_engine::{Dataset, EngineError, Key, Table, Value};

// ============================================================================
// WORKBOOK
// ============================================================================

/// Represents a complete workbook that can be saved/loaded
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub active_sheet: usize,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self {
            sheets,
            active_sheet: 0,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }
}

// ============================================================================
// SHEET
// ============================================================================

/// Represents a single worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), SavedCell>,
    pub column_widths: HashMap<u32, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
            column_widths: HashMap::new(),
        }
    }

    pub fn set(&mut self, row: u32, col: u32, value: SavedCellValue) {
        self.cells.insert((row, col), SavedCell { value, header: false });
    }

    pub fn set_header(&mut self, row: u32, col: u32, value: SavedCellValue) {
        self.cells.insert((row, col), SavedCell { value, header: true });
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&SavedCellValue> {
        self.cells.get(&(row, col)).map(|c| &c.value)
    }

    /// One past the last used row and column.
    pub fn extent(&self) -> (u32, u32) {
        self.cells
            .keys()
            .fold((0, 0), |(rows, cols), &(r, c)| (rows.max(r + 1), cols.max(c + 1)))
    }

    /// Lays a table out the way a labelled frame is usually written:
    /// one header row per column level (level name, then keys), a row of
    /// row-level names, then one row per table row with its keys before its
    /// cells. Subtotal keys are written as empty strings, cells without a
    /// value are left empty.
    pub fn from_table(name: impl Into<String>, table: &Table) -> Self {
        let mut sheet = Sheet::new(name);
        let row_levels = table.row_names().len() as u32;
        let column_levels = table.column_names().len() as u32;
        let label_col = row_levels.saturating_sub(1);

        for (level, level_name) in table.column_names().iter().enumerate() {
            let level = level as u32;
            sheet.set_header(level, label_col, SavedCellValue::Text(level_name.clone()));
            for (c, key) in table.column_keys().iter().enumerate() {
                sheet.set_header(level, row_levels + c as u32, SavedCellValue::from_key(&key[level as usize]));
            }
        }

        for (i, level_name) in table.row_names().iter().enumerate() {
            sheet.set_header(column_levels, i as u32, SavedCellValue::Text(level_name.clone()));
        }

        let first_data_row = column_levels + 1;
        for (r, row_key) in table.row_keys().iter().enumerate() {
            let row = first_data_row + r as u32;
            for (i, key) in row_key.iter().enumerate() {
                sheet.set_header(row, i as u32, SavedCellValue::from_key(key));
            }
            for c in 0..table.column_count() {
                if let Some(value) = table.cell(r, c) {
                    sheet.set(row, row_levels + c as u32, SavedCellValue::from_value(value));
                }
            }
        }

        for i in 0..row_levels {
            sheet.column_widths.insert(i, LABEL_COLUMN_WIDTH);
        }
        sheet
    }

    /// Reads the sheet as a dataset, taking the first row as column names.
    /// Rows without any cell are skipped.
    pub fn to_dataset(&self) -> Result<Dataset, PersistenceError> {
        let (rows, cols) = self.extent();
        if rows == 0 {
            return Err(PersistenceError::InvalidFormat(format!(
                "sheet '{}' is empty",
                self.name
            )));
        }

        let mut headers = Vec::with_capacity(cols as usize);
        for col in 0..cols {
            let header = match self.get(0, col) {
                Some(SavedCellValue::Text(s)) if !s.trim().is_empty() => s.clone(),
                Some(SavedCellValue::Number(n)) => Value::Number(*n).display_value(),
                Some(SavedCellValue::Boolean(b)) => Value::Boolean(*b).display_value(),
                _ => {
                    return Err(PersistenceError::InvalidFormat(format!(
                        "sheet '{}' has an empty header in column {}",
                        self.name,
                        col + 1
                    )))
                }
            };
            headers.push(header);
        }

        let mut dataset = Dataset::new(headers).map_err(|e| match e {
            EngineError::DuplicateColumn(name) => PersistenceError::InvalidFormat(format!(
                "sheet '{}' has duplicate header '{}'",
                self.name, name
            )),
            other => PersistenceError::Dataset(other),
        })?;

        let mut coerced = 0usize;
        for row in 1..rows {
            if (0..cols).all(|col| self.get(row, col).is_none()) {
                continue;
            }
            let record = (0..cols)
                .map(|col| match self.get(row, col) {
                    Some(SavedCellValue::Error(_)) => {
                        coerced += 1;
                        Value::Missing
                    }
                    Some(value) => value.to_value(),
                    None => Value::Missing,
                })
                .collect();
            dataset.push_row(record)?;
        }

        if coerced > 0 {
            log::warn!(
                "[PERSIST] sheet '{}': {} error cells read as missing",
                self.name,
                coerced
            );
        }
        Ok(dataset)
    }
}

/// Width of row-label columns in written sheets, in characters.
const LABEL_COLUMN_WIDTH: f64 = 16.0;

// ============================================================================
// SAVED CELL
// ============================================================================

/// A cell that can be serialized
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCell {
    pub value: SavedCellValue,
    /// Header and label cells are written in bold.
    pub header: bool,
}

/// Serializable cell value
#[derive(Debug, Clone, PartialEq)]
pub enum SavedCellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
}

impl SavedCellValue {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Missing => SavedCellValue::Empty,
            Value::Blank => SavedCellValue::Text(String::new()),
            Value::Number(n) => SavedCellValue::Number(*n),
            Value::Text(s) => SavedCellValue::Text(s.clone()),
            Value::Boolean(b) => SavedCellValue::Boolean(*b),
        }
    }

    pub fn from_key(key: &Key) -> Self {
        SavedCellValue::from_value(&key.to_value())
    }

    /// Empty cells and empty strings read as missing.
    pub fn to_value(&self) -> Value {
        match self {
            SavedCellValue::Empty | SavedCellValue::Error(_) => Value::Missing,
            SavedCellValue::Text(s) if s.is_empty() => Value::Missing,
            SavedCellValue::Number(n) => Value::Number(*n),
            SavedCellValue::Text(s) => Value::Text(s.clone()),
            SavedCellValue::Boolean(b) => Value::Boolean(*b),
        }
    }
}
