//! Spreadsheet loading for daily checks workbooks
//!
//! Cell values are read with calamine. Embedded screenshots are pulled
//! straight out of the XLSX package (worksheet → drawing → media), since
//! calamine does not expose per-sheet pictures.

pub mod cells;
pub mod media;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use shared_types::Workbook;
use thiserror::Error;

pub use cells::read_sheets;
pub use media::extract_images;

#[derive(Error, Debug)]
pub enum XlsxError {
    #[error("Failed to open workbook: {0}")]
    Open(String),

    #[error("Failed to read sheet '{sheet}': {reason}")]
    Sheet { sheet: String, reason: String },

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Invalid XLSX package: {0}")]
    Package(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Load a workbook with cell values and embedded images.
///
/// Image extraction is best effort: a package whose drawing parts cannot be
/// read still yields the cell data, with no images attached.
pub fn load_workbook(path: &Path) -> Result<Workbook, XlsxError> {
    let mut sheets = read_sheets(path)?;

    let file = File::open(path)?;
    let mut images = extract_images(BufReader::new(file)).unwrap_or_else(|e| {
        tracing::warn!("Could not extract images from {}: {}", path.display(), e);
        BTreeMap::new()
    });

    for sheet in &mut sheets {
        if let Some(sheet_images) = images.remove(&sheet.name) {
            sheet.images = sheet_images;
        }
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    tracing::info!(
        "Loaded {} with {} sheets and {} embedded images",
        name,
        sheets.len(),
        sheets.iter().map(|s| s.images.len()).sum::<usize>()
    );

    Ok(Workbook::new(name, sheets))
}
