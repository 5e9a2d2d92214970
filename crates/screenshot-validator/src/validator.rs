//! Screenshot validation run
//!
//! A run ends in one of three states. `NoImages` and `NoVisionBackend` are
//! early exits with nothing analysed; neither is an error. `Completed` means
//! every image was sent to the backend, each in its own slot: a failed,
//! refused or timed-out call only removes that image from the analyses.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use shared_types::{EmbeddedImage, Finding, Workbook};

use crate::extraction::ScreenshotAnalysis;
use crate::reconcile::{reconcile, ValidationIssue};
use crate::reported::ReportedValues;
use crate::vision::VisionBackend;
use crate::VisionError;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    NoImages,
    NoVisionBackend,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRun {
    pub state: ValidationState,
    pub images_found: usize,
    pub analyses: Vec<ScreenshotAnalysis>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationRun {
    fn skipped(state: ValidationState, images_found: usize) -> Self {
        Self {
            state,
            images_found,
            analyses: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn analyzed(&self) -> usize {
        self.analyses.len()
    }

    /// Issues as audit findings
    pub fn findings(&self) -> Vec<Finding> {
        self.issues.iter().map(ValidationIssue::to_finding).collect()
    }

    /// Plain-text summary
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Screenshot Validation Report");
        let _ = writeln!(out, "analyzed {} screenshots.", self.analyzed());

        match self.state {
            ValidationState::NoImages => {
                let _ = writeln!(out, "No embedded images found.");
            }
            ValidationState::NoVisionBackend => {
                let _ = writeln!(
                    out,
                    "Found {} embedded images, but no vision service is configured (set AZURE_OPENAI_API_KEY and AZURE_OPENAI_ENDPOINT).",
                    self.images_found
                );
            }
            ValidationState::Completed if self.analyzed() < self.images_found => {
                let _ = writeln!(
                    out,
                    "{} of {} images could not be analyzed.",
                    self.images_found - self.analyzed(),
                    self.images_found
                );
            }
            ValidationState::Completed => {}
        }

        if self.issues.is_empty() {
            let _ = writeln!(out, "No validation issues found.");
        } else {
            let _ = writeln!(out, "Found {} issues:", self.issues.len());
            for issue in &self.issues {
                let _ = writeln!(
                    out,
                    "- [{}] {}: {}",
                    issue.severity.as_str().to_uppercase(),
                    issue.sheet,
                    issue.message
                );
                let _ = writeln!(out, "  - Screenshot shows: {}", issue.screenshot_value);
                let _ = writeln!(out, "  - Reported value: {}", issue.reported_value);
            }
        }

        out.trim_end().to_string()
    }
}

/// Drives vision analysis and reconciliation for a workbook
#[derive(Clone)]
pub struct ScreenshotValidator {
    backend: Option<Arc<dyn VisionBackend>>,
    max_concurrency: usize,
    timeout: Duration,
}

impl ScreenshotValidator {
    /// `None` disables analysis; runs then end in `NoVisionBackend`.
    pub fn new(backend: Option<Arc<dyn VisionBackend>>) -> Self {
        Self {
            backend,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn validate(&self, workbook: &Workbook) -> ValidationRun {
        let images: Vec<&EmbeddedImage> = workbook.images().collect();

        if images.is_empty() {
            tracing::info!("No embedded images found");
            return ValidationRun::skipped(ValidationState::NoImages, 0);
        }
        tracing::info!("Found {} embedded images", images.len());

        let Some(backend) = &self.backend else {
            tracing::info!("Vision service not configured, skipping screenshot analysis");
            return ValidationRun::skipped(ValidationState::NoVisionBackend, images.len());
        };

        tracing::info!("Analyzing images with {}", backend.name());
        let analyses = self.analyze_images(backend.as_ref(), &images).await;

        let mut reported_by_sheet: BTreeMap<&str, ReportedValues> = BTreeMap::new();
        let mut issues = Vec::new();
        for analysis in &analyses {
            let Some(sheet) = workbook.sheet(&analysis.sheet) else {
                continue;
            };
            let reported = reported_by_sheet
                .entry(sheet.name.as_str())
                .or_insert_with(|| ReportedValues::from_sheet(sheet));
            issues.extend(reconcile(analysis, reported));
        }

        tracing::info!(
            "Screenshot validation: {} of {} analyzed, {} issues",
            analyses.len(),
            images.len(),
            issues.len()
        );

        ValidationRun {
            state: ValidationState::Completed,
            images_found: images.len(),
            analyses,
            issues,
        }
    }

    /// Analyse images with bounded fan-out, returning successful analyses in
    /// image order.
    async fn analyze_images(
        &self,
        backend: &dyn VisionBackend,
        images: &[&EmbeddedImage],
    ) -> Vec<ScreenshotAnalysis> {
        let mut slots: Vec<(usize, Option<ScreenshotAnalysis>)> =
            stream::iter(images.iter().enumerate())
                .map(|(idx, image)| async move { (idx, self.analyze_one(backend, image).await) })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        slots.sort_by_key(|(idx, _)| *idx);
        slots.into_iter().filter_map(|(_, analysis)| analysis).collect()
    }

    async fn analyze_one(
        &self,
        backend: &dyn VisionBackend,
        image: &EmbeddedImage,
    ) -> Option<ScreenshotAnalysis> {
        tracing::debug!("Analyzing {}", image.id);

        let result = match tokio::time::timeout(self.timeout, backend.analyze(image)).await {
            Ok(result) => result,
            Err(_) => Err(VisionError::Timeout(self.timeout)),
        };

        match result {
            Ok(response) => Some(ScreenshotAnalysis::new(&image.sheet, &image.id, response)),
            Err(e) => {
                tracing::warn!("Error analyzing image {}: {}", image.id, e);
                None
            }
        }
    }
}
