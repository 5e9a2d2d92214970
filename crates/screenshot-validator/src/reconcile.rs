// Screenshot vs. sheet reconciliation
use std::fmt;

use serde::Serialize;
use shared_types::{Finding, FindingCategory, Severity};

use crate::extraction::ScreenshotAnalysis;
use crate::reported::ReportedValues;

/// What the screenshot showed for a disputed metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ObservedValue {
    Count(i64),
    Indicators(Vec<String>),
}

impl fmt::Display for ObservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedValue::Count(n) => write!(f, "{}", n),
            ObservedValue::Indicators(items) => write!(f, "{:?}", items),
        }
    }
}

/// A disagreement between one screenshot and its sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub sheet: String,
    pub image_id: String,
    pub severity: Severity,
    pub message: String,
    pub screenshot_value: ObservedValue,
    pub reported_value: i64,
}

impl ValidationIssue {
    /// Audit finding for this issue (not row-scoped)
    pub fn to_finding(&self) -> Finding {
        Finding::new(
            &self.sheet,
            0,
            FindingCategory::ScreenshotValidation,
            self.severity,
            format!("[SCREENSHOT] {}", self.message),
        )
        .with_context(format!("Image: {}", self.image_id))
    }
}

/// Compare one analysis against the sheet's reported values.
///
/// Unclassified screenshots are skipped. A count is only compared when both
/// sides carry a value.
pub fn reconcile(analysis: &ScreenshotAnalysis, reported: &ReportedValues) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !analysis.kind.is_classified() {
        tracing::debug!("Skipping unclassified screenshot {}", analysis.image_id);
        return issues;
    }

    let fields = &analysis.fields;
    let counts = [
        (fields.failed_data_backup, reported.failed_data_backup, "failed data backups"),
        (fields.failed_log_backup, reported.failed_log_backup, "failed log backups"),
        (fields.failed_jobs, reported.failed_jobs, "failed jobs"),
    ];

    for (observed, reported, label) in counts {
        let (Some(observed), Some(reported)) = (observed, reported) else {
            continue;
        };
        if observed != reported {
            issues.push(ValidationIssue {
                sheet: analysis.sheet.clone(),
                image_id: analysis.image_id.clone(),
                severity: Severity::Critical,
                message: format!(
                    "Screenshot shows {} {} but cell reports {}",
                    observed, label, reported
                ),
                screenshot_value: ObservedValue::Count(observed),
                reported_value: reported,
            });
        }
    }

    // Only an explicit all-zero report is contradicted by visible errors
    if fields.has_errors && reported.explicit_failure_total() == Some(0) {
        let indicators = ObservedValue::Indicators(fields.error_indicators.clone());
        issues.push(ValidationIssue {
            sheet: analysis.sheet.clone(),
            image_id: analysis.image_id.clone(),
            severity: Severity::Warning,
            message: format!(
                "Screenshot shows error indicators but no failures reported: {}",
                indicators
            ),
            screenshot_value: indicators,
            reported_value: 0,
        });
    }

    issues
}
