//! In-memory view of a daily checks workbook
//!
//! The layout is semi-fixed: label/value header pairs in the first rows of
//! every sheet, check rows from [`DATA_START_ROW`] onwards.

use std::fmt;

/// Number of header rows scanned for label/value metadata
pub const HEADER_ROWS: usize = 5;

/// First data row (1-indexed, as shown in the spreadsheet UI)
pub const DATA_START_ROW: u32 = 6;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Content of a single cell
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Cell rendered as display text, `None` for empty cells
    pub fn display_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Format a number without a trailing `.0` for whole values
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One spreadsheet row with positional cells
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at a 0-indexed column; out-of-range columns read as empty
    pub fn cell(&self, column: usize) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// True when no cell carries content
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }

    /// Non-empty cells joined by a single space, lowercased
    pub fn search_text(&self) -> String {
        self.cells
            .iter()
            .filter_map(CellValue::display_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Short human-readable snippet of the leading cells
    pub fn snippet(&self, columns: std::ops::Range<usize>) -> String {
        columns
            .map(|c| self.cell(c).to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl<T: Into<CellValue>> FromIterator<T> for Row {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Header metadata read from the first rows of a sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SheetMetadata {
    pub system_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub performed_by: Option<String>,
}

/// Image embedded in a sheet's drawing layer
#[derive(Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub sheet: String,
    /// Stable identifier, `<sheet>_img_<index>`
    pub id: String,
    /// Archive path of the media part (e.g. `xl/media/image1.png`)
    pub media_path: String,
    pub bytes: Vec<u8>,
}

impl EmbeddedImage {
    pub fn new(sheet: &str, index: usize, media_path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            sheet: sheet.to_string(),
            id: format!("{}_img_{}", sheet, index),
            media_path: media_path.into(),
            bytes,
        }
    }
}

impl fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("sheet", &self.sheet)
            .field("id", &self.id)
            .field("media_path", &self.media_path)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// All rows from row 1; index 0 is spreadsheet row 1
    pub rows: Vec<Row>,
    pub images: Vec<EmbeddedImage>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<EmbeddedImage>) -> Self {
        self.images = images;
        self
    }

    pub fn header_rows(&self) -> &[Row] {
        &self.rows[..self.rows.len().min(HEADER_ROWS)]
    }

    /// Data rows paired with their 1-indexed row numbers
    pub fn data_rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .skip(DATA_START_ROW as usize - 1)
            .map(|(idx, row)| (idx as u32 + 1, row))
    }

    /// Label/value metadata from the header rows.
    ///
    /// Labels are matched in the order system name, date, time, performed by;
    /// the first matching label on a row claims it.
    pub fn metadata(&self) -> SheetMetadata {
        let mut metadata = SheetMetadata::default();

        for row in self.header_rows() {
            let label = row.cell(0).to_string().trim().to_lowercase();
            let value = row.cell(1).display_text();

            if label.contains("system name") {
                metadata.system_name = value;
            } else if label.contains("date") {
                metadata.date = value;
            } else if label.contains("time") {
                metadata.time = value;
            } else if label.contains("performed by") {
                metadata.performed_by = value;
            }
        }

        metadata
    }
}

/// A parsed workbook: ordered, named sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    /// Document name (usually the file name)
    pub name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn images(&self) -> impl Iterator<Item = &EmbeddedImage> {
        self.sheets.iter().flat_map(|s| s.images.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::text(*c)
                }
            })
            .collect()
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let r = row(&["a"]);
        assert_eq!(r.cell(10), &CellValue::Empty);
    }

    #[test]
    fn test_search_text_skips_empty_and_lowercases() {
        let r = Row::new(vec![
            CellValue::text("SM37"),
            CellValue::Empty,
            CellValue::text("Failed Jobs"),
            CellValue::Number(3.0),
        ]);
        assert_eq!(r.search_text(), "sm37 failed jobs 3");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn test_data_rows_start_at_row_six() {
        let rows: Vec<Row> = (1..=8).map(|i| row(&[format!("r{}", i).as_str()])).collect();
        let sheet = Sheet::new("PRD", rows);
        let numbers: Vec<u32> = sheet.data_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![6, 7, 8]);
        assert_eq!(sheet.data_rows().next().unwrap().1.cell(0), &CellValue::text("r6"));
    }

    #[test]
    fn test_metadata_label_matching() {
        let sheet = Sheet::new(
            "PRD",
            vec![
                row(&["System Name", "PRD ECC"]),
                row(&["Date", "2026-01-20 00:00:00"]),
                row(&["Time", "08:30:00"]),
                row(&["Performed By", "J. Doe"]),
                row(&["", ""]),
                row(&["SM51 application servers running", "", "", "Y"]),
            ],
        );
        let meta = sheet.metadata();
        assert_eq!(meta.system_name.as_deref(), Some("PRD ECC"));
        assert_eq!(meta.date.as_deref(), Some("2026-01-20 00:00:00"));
        assert_eq!(meta.time.as_deref(), Some("08:30:00"));
        assert_eq!(meta.performed_by.as_deref(), Some("J. Doe"));
    }

    #[test]
    fn test_metadata_ignores_data_rows() {
        let mut rows: Vec<Row> = (0..5).map(|_| Row::default()).collect();
        rows.push(row(&["Performed by", "late"]));
        let sheet = Sheet::new("PRD", rows);
        assert_eq!(sheet.metadata(), SheetMetadata::default());
    }

    #[test]
    fn test_embedded_image_id() {
        let image = EmbeddedImage::new("PRD", 2, "xl/media/image3.png", vec![1, 2, 3]);
        assert_eq!(image.id, "PRD_img_2");
        assert!(format!("{:?}", image).contains("bytes: 3"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn cell() -> impl Strategy<Value = CellValue> {
            prop_oneof![
                Just(CellValue::Empty),
                "[A-Za-z0-9 ]{0,12}".prop_map(CellValue::Text),
                any::<f64>().prop_map(CellValue::Number),
            ]
        }

        proptest! {
            #[test]
            fn search_text_is_lowercase(cells in prop::collection::vec(cell(), 0..10)) {
                let text = Row::new(cells).search_text();
                prop_assert_eq!(text.to_lowercase(), text);
            }

            #[test]
            fn snippet_never_panics(
                cells in prop::collection::vec(cell(), 0..10),
                start in 0usize..12,
                len in 0usize..12,
            ) {
                let _ = Row::new(cells).snippet(start..start + len);
            }

            #[test]
            fn blank_rows_have_no_search_text(width in 0usize..8) {
                let row = Row::new(vec![CellValue::Empty; width]);
                prop_assert!(row.is_blank());
                prop_assert_eq!(row.search_text(), "");
            }
        }
    }
}
