//! FILENAME: persistence/src/xlsx_reader.rs

use crate::{PersistenceError, SavedCell, SavedCellValue, Sheet, Workbook};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::collections::HashMap;
use std::path::Path;
use tabular_engine::Dataset;

pub fn load_xlsx(path: &Path) -> Result<Workbook, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut sheets = Vec::new();

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

        // The used range may not start at A1
        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let mut cells = HashMap::new();

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let value = match cell {
                    Data::Empty => continue,
                    Data::String(s) => SavedCellValue::Text(s.clone()),
                    Data::Float(f) => SavedCellValue::Number(*f),
                    Data::Int(i) => SavedCellValue::Number(*i as f64),
                    Data::Bool(b) => SavedCellValue::Boolean(*b),
                    Data::Error(e) => SavedCellValue::Error(format!("{:?}", e)),
                    Data::DateTime(dt) => SavedCellValue::Number(dt.as_f64()),
                    Data::DateTimeIso(s) => SavedCellValue::Text(s.clone()),
                    Data::DurationIso(s) => SavedCellValue::Text(s.clone()),
                };

                cells.insert(
                    (first_row + row_idx as u32, first_col + col_idx as u32),
                    SavedCell {
                        value,
                        header: false,
                    },
                );
            }
        }

        log::debug!("[PERSIST] read sheet '{}' cells={}", sheet_name, cells.len());
        sheets.push(Sheet {
            name: sheet_name.clone(),
            cells,
            column_widths: HashMap::new(),
        });
    }

    Ok(Workbook {
        sheets,
        active_sheet: 0,
    })
}

/// Loads one sheet of an XLSX file as a dataset. Without a sheet name the
/// first sheet is used.
pub fn load_dataset(path: &Path, sheet: Option<&str>) -> Result<Dataset, PersistenceError> {
    let workbook = load_xlsx(path)?;
    let sheet = match sheet {
        Some(name) => workbook
            .sheet(name)
            .ok_or_else(|| PersistenceError::SheetNotFound(name.to_string()))?,
        None => workbook
            .sheets
            .first()
            .ok_or_else(|| PersistenceError::InvalidFormat("Workbook contains no sheets".to_string()))?,
    };

    let dataset = sheet.to_dataset()?;
    log::info!(
        "[PERSIST] loaded '{}' from {}: {} records, {} columns",
        sheet.name,
        path.display(),
        dataset.len(),
        dataset.columns().len()
    );
    Ok(dataset)
}
