pub mod types;
pub mod workbook;

pub use types::{CheckCategory, Finding, FindingCategory, Severity};
pub use workbook::{
    format_number, CellValue, EmbeddedImage, Row, Sheet, SheetMetadata, Workbook, DATA_START_ROW,
    HEADER_ROWS,
};
