//! Cell import via calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use shared_types::{format_number, CellValue, Row, Sheet};

use crate::XlsxError;

/// Read every sheet of a workbook (xlsx, xls, xlsb, ods) into positional rows.
///
/// Rows are anchored at spreadsheet row 1 and column A regardless of where the
/// used range starts, so column positions stay meaningful.
pub fn read_sheets(path: &Path) -> Result<Vec<Sheet>, XlsxError> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| XlsxError::Open(e.to_string()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(XlsxError::NoSheets);
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| XlsxError::Sheet {
                sheet: sheet_name.clone(),
                reason: e.to_string(),
            })?;

        let rows = range_to_rows(&range);
        tracing::debug!("Sheet '{}': {} rows", sheet_name, rows.len());
        sheets.push(Sheet::new(sheet_name.clone(), rows));
    }

    Ok(sheets)
}

fn range_to_rows(range: &Range<Data>) -> Vec<Row> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Row> = vec![Row::default(); start_row as usize];
    for cells in range.rows() {
        let mut values = vec![CellValue::Empty; start_col as usize];
        values.extend(cells.iter().map(convert_cell));
        rows.push(Row::new(values));
    }
    rows
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match dt.as_datetime() {
                // Time-only cells carry no date part
                Some(value) if serial < 1.0 => CellValue::Text(value.format("%H:%M:%S").to_string()),
                Some(value) => CellValue::Text(value.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => CellValue::Text(format_number(serial)),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
