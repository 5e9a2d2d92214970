//! Screenshot cross-validation for daily checks workbooks
//!
//! Embedded screenshots are sent to a vision backend for structured
//! extraction of backup and job failure counts, which are then reconciled
//! against the values typed into the same sheet.

pub mod azure;
pub mod extraction;
pub mod reconcile;
pub mod reported;
pub mod validator;
pub mod vision;

use std::time::Duration;

use thiserror::Error;

pub use azure::{AzureConfig, AzureVisionClient};
pub use extraction::{ExtractedFields, ScreenshotAnalysis, ScreenshotKind, VisionResponse};
pub use reconcile::{reconcile, ObservedValue, ValidationIssue};
pub use reported::ReportedValues;
pub use validator::{ScreenshotValidator, ValidationRun, ValidationState};
pub use vision::{VisionBackend, VISION_PROMPT};

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model refused the request: {0}")]
    Refusal(String),

    #[error("Response contained no content")]
    EmptyResponse,

    #[error("Failed to parse structured response: {0}")]
    Parse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for VisionError {
    fn from(err: reqwest::Error) -> Self {
        VisionError::Request(err.to_string())
    }
}
