pub mod config;
pub mod extractors;
pub mod patterns;
pub mod report;
pub mod rules;

pub use config::{ConfigError, ConfigResolver, CustomerConfig, ThresholdOverride};
pub use report::{AuditReport, ScreenshotStats, SheetStatus};

use serde::Serialize;
use shared_types::{Finding, Sheet, SheetMetadata, Workbook};

use rules::RowContext;

/// Findings and header metadata for one sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetAudit {
    pub sheet: String,
    pub metadata: SheetMetadata,
    pub findings: Vec<Finding>,
}

/// Result of auditing every sheet of a workbook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookAudit {
    pub document: String,
    pub sheets: Vec<SheetAudit>,
}

impl WorkbookAudit {
    /// All findings, sheet by sheet
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.sheets.iter().flat_map(|s| s.findings.iter())
    }

    pub fn critical_count(&self) -> usize {
        self.findings().filter(|f| f.is_critical()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings().filter(|f| !f.is_critical()).count()
    }

    /// Append findings produced outside the row loop (screenshot
    /// reconciliation) to their sheets.
    pub fn append_findings(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            match self.sheets.iter_mut().find(|s| s.sheet == finding.sheet) {
                Some(sheet) => sheet.findings.push(finding),
                None => tracing::warn!(
                    "Dropping finding for unknown sheet '{}': {}",
                    finding.sheet,
                    finding.message
                ),
            }
        }
    }

    pub fn report(&self, screenshots: Option<ScreenshotStats>) -> AuditReport {
        let metadata: Vec<(String, SheetMetadata)> = self
            .sheets
            .iter()
            .map(|s| (s.sheet.clone(), s.metadata.clone()))
            .collect();
        let findings: Vec<Finding> = self.findings().cloned().collect();

        AuditReport::compose(&self.document, &metadata, &findings, screenshots)
    }
}

/// AuditEngine entry point
#[derive(Debug, Clone, Default)]
pub struct AuditEngine {
    config: Option<CustomerConfig>,
}

impl AuditEngine {
    /// Engine with built-in default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Option<CustomerConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> Option<&CustomerConfig> {
        self.config.as_ref()
    }

    /// Audit one sheet. Rows are evaluated in order, with the sticky
    /// category threaded through the fold; blank rows are skipped.
    pub fn audit_sheet(&self, sheet: &Sheet) -> SheetAudit {
        let (_, findings) = sheet
            .data_rows()
            .filter(|(_, row)| !row.is_blank())
            .fold(
                (None, Vec::new()),
                |(current, mut findings), (row_number, row)| {
                    let category = patterns::sticky(current, row);
                    let ctx = RowContext {
                        sheet: &sheet.name,
                        row_number,
                        category,
                        config: self.config(),
                    };
                    findings.extend(rules::evaluate_row(&ctx, row));
                    (category, findings)
                },
            );

        tracing::debug!("Sheet '{}': {} findings", sheet.name, findings.len());

        SheetAudit {
            sheet: sheet.name.clone(),
            metadata: sheet.metadata(),
            findings,
        }
    }

    pub fn audit_workbook(&self, workbook: &Workbook) -> WorkbookAudit {
        tracing::info!("Found {} system sheets", workbook.sheets.len());

        let sheets: Vec<SheetAudit> = workbook.sheets.iter().map(|s| self.audit_sheet(s)).collect();

        let audit = WorkbookAudit {
            document: workbook.name.clone(),
            sheets,
        };
        tracing::info!(
            "Audit of {}: {} critical, {} warnings",
            audit.document,
            audit.critical_count(),
            audit.warning_count()
        );
        audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{CellValue, CheckCategory, FindingCategory, Row, Severity};

    fn header() -> Vec<Row> {
        vec![
            Row::new(vec![CellValue::text("System Name"), CellValue::text("PRD")]),
            Row::new(vec![CellValue::text("Date"), CellValue::text("2026-01-20")]),
            Row::new(vec![CellValue::text("Time"), CellValue::text("07:45")]),
            Row::new(vec![CellValue::text("Performed By"), CellValue::text("J. Doe")]),
            Row::default(),
        ]
    }

    fn check(label: &str, response: CellValue, status: &str) -> Row {
        Row::new(vec![
            CellValue::Empty,
            CellValue::text(label),
            CellValue::Empty,
            response,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::text(status),
        ])
    }

    fn sheet(rows: Vec<Row>) -> Sheet {
        let mut all = header();
        all.extend(rows);
        Sheet::new("PRD", all)
    }

    #[test]
    fn test_sticky_category_attribution() {
        let sheet = sheet(vec![
            check("SM37 failed job header", CellValue::Empty, ""),
            check("", CellValue::text("N"), ""),
            check("", CellValue::text("N"), ""),
        ]);

        let audit = AuditEngine::new().audit_sheet(&sheet);

        assert_eq!(audit.findings.len(), 2);
        for (finding, row) in audit.findings.iter().zip([7, 8]) {
            assert_eq!(finding.row, row);
            assert_eq!(
                finding.category,
                FindingCategory::Check(CheckCategory::JobMonitor)
            );
        }
    }

    #[test]
    fn test_blank_rows_keep_category() {
        let sheet = sheet(vec![
            check("ST22", CellValue::Empty, ""),
            Row::default(),
            check("", CellValue::text("N"), "OK"),
        ]);

        let audit = AuditEngine::new().audit_sheet(&sheet);
        assert_eq!(audit.findings[0].row, 8);
        assert_eq!(
            audit.findings[0].category,
            FindingCategory::Check(CheckCategory::DumpMonitor)
        );
        assert_eq!(audit.findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_both_passes_fire_on_one_row() {
        let sheet = sheet(vec![Row::new(vec![
            CellValue::Empty,
            CellValue::text("Failed updates"),
            CellValue::Empty,
            CellValue::text("N"),
            CellValue::Number(2.0),
        ])]);

        let audit = AuditEngine::new().audit_sheet(&sheet);
        let messages: Vec<&str> = audit.findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Negative (N) response without justification",
                "Failed updates detected: 2",
            ]
        );
    }

    #[test]
    fn test_header_rows_are_not_audited() {
        let mut rows = header();
        rows[1] = Row::new(vec![
            CellValue::text("Failed updates"),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::text("N"),
        ]);
        let audit = AuditEngine::new().audit_sheet(&Sheet::new("PRD", rows));
        assert!(audit.findings.is_empty());
    }

    #[test]
    fn test_metadata_extracted() {
        let audit = AuditEngine::new().audit_sheet(&sheet(vec![]));
        assert_eq!(audit.metadata.system_name.as_deref(), Some("PRD"));
        assert_eq!(audit.metadata.performed_by.as_deref(), Some("J. Doe"));
    }

    #[test]
    fn test_config_override_applies() {
        let config = CustomerConfig::from_json(
            r#"{"thresholds": {"dump_count_today": {"max": 10}}}"#,
        )
        .unwrap();
        let sheet = sheet(vec![check("ABAP dumps today", CellValue::Number(11.0), "")]);

        let default_audit = AuditEngine::new().audit_sheet(&sheet);
        assert!(default_audit.findings.is_empty());

        let audit = AuditEngine::with_config(Some(config)).audit_sheet(&sheet);
        assert_eq!(audit.findings.len(), 1);
        assert_eq!(
            audit.findings[0].message,
            "High dump count today: 11 (threshold: 10)"
        );
    }

    #[test]
    fn test_audit_is_idempotent() {
        let workbook = Workbook::new(
            "TBS_DAILY.xlsx",
            vec![sheet(vec![
                check("SM13 failed updates", CellValue::Number(3.0), ""),
                check("Old locks", CellValue::text("N"), ""),
                check("Avg resp time", CellValue::text("1 400"), ""),
            ])],
        );
        let engine = AuditEngine::new();

        let first = engine.audit_workbook(&workbook);
        let second = engine.audit_workbook(&workbook);
        assert_eq!(first, second);
        assert!(first.report(None).content_eq(&second.report(None)));
    }

    #[test]
    fn test_clean_workbook_passes() {
        let workbook = Workbook::new(
            "TBS_DAILY.xlsx",
            vec![sheet(vec![
                check("SM51 application servers running", CellValue::text("Y"), ""),
                check("ABAP dumps today", CellValue::Number(12.0), ""),
                check("Failed updates", CellValue::Number(0.0), ""),
                check("Avg resp time", CellValue::Number(640.0), ""),
            ])],
        );

        let report = AuditEngine::new().audit_workbook(&workbook).report(None);

        assert_eq!(report.summary.total_findings, 0);
        assert_eq!(report.sheet("PRD").unwrap().status, SheetStatus::Passed);
        assert!(report.to_markdown().contains("### [OK] PRD"));
    }

    #[test]
    fn test_append_findings_routes_by_sheet() {
        let workbook = Workbook::new("TBS_DAILY.xlsx", vec![sheet(vec![])]);
        let mut audit = AuditEngine::new().audit_workbook(&workbook);

        audit.append_findings(vec![
            Finding::critical("PRD", 0, FindingCategory::ScreenshotValidation, "[SCREENSHOT] x"),
            Finding::critical("NOPE", 0, FindingCategory::ScreenshotValidation, "[SCREENSHOT] y"),
        ]);

        assert_eq!(audit.sheets[0].findings.len(), 1);
        assert_eq!(audit.critical_count(), 1);
    }
}
