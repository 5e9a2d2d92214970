//! Daily checks audit pipeline
//!
//! Ties the pieces together for the binaries: load the workbook, resolve the
//! customer configuration, run the rule engine, optionally cross-validate
//! screenshots, and compose the report.

pub mod service;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use audit_engine::{AuditReport, WorkbookAudit};
pub use screenshot_validator::ValidationRun;
pub use service::{AuditOutcome, AuditService};
pub use settings::Settings;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load Excel workbook: {0}")]
    Workbook(#[from] shared_xlsx::XlsxError),

    #[error("Failed to load customer configuration: {0}")]
    Config(#[from] audit_engine::ConfigError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
