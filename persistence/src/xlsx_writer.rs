//! FILENAME: persistence/src/xlsx_writer.rs

use crate::{PersistenceError, SavedCellValue, Workbook};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::path::Path;

pub fn save_xlsx(workbook: &Workbook, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let bold = Format::new().set_bold();

    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, width) in &sheet.column_widths {
            worksheet.set_column_width(*col as u16, *width)?;
        }

        for ((row, col), cell) in &sheet.cells {
            let (row, col) = (*row, *col as u16);
            let format = cell.header.then_some(&bold);

            match (&cell.value, format) {
                (SavedCellValue::Empty, _) => {}
                (SavedCellValue::Number(n), Some(fmt)) => {
                    worksheet.write_number_with_format(row, col, *n, fmt)?;
                }
                (SavedCellValue::Number(n), None) => {
                    worksheet.write_number(row, col, *n)?;
                }
                (SavedCellValue::Text(s), Some(fmt)) => {
                    worksheet.write_string_with_format(row, col, s, fmt)?;
                }
                (SavedCellValue::Text(s), None) => {
                    worksheet.write_string(row, col, s)?;
                }
                (SavedCellValue::Boolean(b), Some(fmt)) => {
                    worksheet.write_boolean_with_format(row, col, *b, fmt)?;
                }
                (SavedCellValue::Boolean(b), None) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                (SavedCellValue::Error(_), Some(fmt)) => {
                    worksheet.write_string_with_format(row, col, "#ERROR!", fmt)?;
                }
                (SavedCellValue::Error(_), None) => {
                    worksheet.write_string(row, col, "#ERROR!")?;
                }
            }
        }

        log::debug!("[PERSIST] wrote sheet '{}' cells={}", sheet.name, sheet.cells.len());
    }

    xlsx.save(path)?;
    log::info!("[PERSIST] saved {} sheets to {}", workbook.sheets.len(), path.display());
    Ok(())
}
