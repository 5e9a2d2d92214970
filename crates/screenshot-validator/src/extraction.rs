use serde::{Deserialize, Serialize};

/// Fields a vision backend extracts from one screenshot.
///
/// Counts are `None` when not visible in the image, which is different from
/// an explicit zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub failed_data_backup: Option<i64>,
    #[serde(default)]
    pub failed_log_backup: Option<i64>,
    #[serde(default)]
    pub failed_jobs: Option<i64>,
    #[serde(default)]
    pub successful_backups: Option<i64>,
    #[serde(default)]
    pub total_entries: Option<i64>,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default)]
    pub error_indicators: Vec<String>,
}

/// Structured response expected from the vision backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub data: ExtractedFields,
}

/// What a screenshot shows, as classified by the vision backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenshotKind {
    Backup,
    Jobs,
    Logs,
    Other,
    /// Missing, empty or "unknown" type; never reconciled
    Unclassified,
}

impl ScreenshotKind {
    /// Free-form labels the backend invents still count as classified.
    pub fn parse(kind: &str) -> Self {
        match kind.trim().to_lowercase().as_str() {
            "" | "unknown" => ScreenshotKind::Unclassified,
            "backup" | "backups" => ScreenshotKind::Backup,
            "jobs" | "job" => ScreenshotKind::Jobs,
            "logs" | "log" => ScreenshotKind::Logs,
            _ => ScreenshotKind::Other,
        }
    }

    pub fn is_classified(&self) -> bool {
        *self != ScreenshotKind::Unclassified
    }
}

/// Successful analysis of one embedded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotAnalysis {
    pub sheet: String,
    pub image_id: String,
    pub kind: ScreenshotKind,
    pub summary: String,
    pub fields: ExtractedFields,
}

impl ScreenshotAnalysis {
    pub fn new(sheet: impl Into<String>, image_id: impl Into<String>, response: VisionResponse) -> Self {
        Self {
            sheet: sheet.into(),
            image_id: image_id.into(),
            kind: ScreenshotKind::parse(&response.kind),
            summary: response.summary,
            fields: response.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_kind() {
        assert_eq!(ScreenshotKind::parse("backup"), ScreenshotKind::Backup);
        assert_eq!(ScreenshotKind::parse(" Jobs "), ScreenshotKind::Jobs);
        assert_eq!(ScreenshotKind::parse("other"), ScreenshotKind::Other);
        assert_eq!(ScreenshotKind::parse("Unknown"), ScreenshotKind::Unclassified);
        assert_eq!(ScreenshotKind::parse(""), ScreenshotKind::Unclassified);
        assert_eq!(ScreenshotKind::parse("  "), ScreenshotKind::Unclassified);
    }

    #[test]
    fn test_free_form_kind_is_classified() {
        let kind = ScreenshotKind::parse("Backup Overview");
        assert_eq!(kind, ScreenshotKind::Other);
        assert!(kind.is_classified());
    }

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{
            "type": "backup",
            "summary": "DB13 backup overview",
            "data": {
                "failed_data_backup": 2,
                "failed_log_backup": null,
                "failed_jobs": null,
                "successful_backups": 12,
                "total_entries": 14,
                "has_errors": true,
                "error_indicators": ["Backup failed"]
            }
        }"#;
        let response: VisionResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.kind, "backup");
        assert_eq!(response.data.failed_data_backup, Some(2));
        assert_eq!(response.data.failed_log_backup, None);
        assert!(response.data.has_errors);
    }

    #[test]
    fn test_deserialize_missing_fields_default() {
        let response: VisionResponse =
            serde_json::from_str(r#"{"type": "other", "data": {}}"#).unwrap();
        assert_eq!(response.data, ExtractedFields::default());
        assert_eq!(response.summary, "");
    }
}
