// Response, justification and numeric value extraction from check rows
use shared_types::{CellValue, Row};

/// Columns holding Y/N responses (D, E)
pub const RESPONSE_COLUMNS: [usize; 2] = [3, 4];

/// Columns scanned for a reported metric value (D, E, F)
pub const NUMERIC_COLUMNS: [usize; 3] = [3, 4, 5];

/// Column holding the status / justification text (G)
pub const STATUS_COLUMN: usize = 6;

/// True if any response column holds `N` (case-insensitive, trimmed)
pub fn is_negative_response(row: &Row) -> bool {
    RESPONSE_COLUMNS.iter().any(|&column| match row.cell(column) {
        CellValue::Text(text) => text.trim().eq_ignore_ascii_case("n"),
        _ => false,
    })
}

/// Justification text from the status column, trimmed.
///
/// Whitespace-only content, including non-breaking spaces, counts as absent.
pub fn justification(row: &Row) -> Option<String> {
    let text = row.cell(STATUS_COLUMN).display_text()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a number typed as text, accepting a comma decimal separator and
/// embedded spaces ("1 250,5").
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .replace(',', ".")
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First parseable numeric value in the metric columns, with its column.
///
/// Unparseable text moves on to the next column.
pub fn extract_numeric_value(row: &Row) -> Option<(f64, usize)> {
    NUMERIC_COLUMNS.iter().find_map(|&column| {
        let value = match row.cell(column) {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(text) => parse_numeric_text(text),
            CellValue::Empty => None,
        };
        value.map(|v| (v, column))
    })
}
