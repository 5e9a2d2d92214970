//! Audit report composition and Markdown rendering
//!
//! Composition is deterministic for a given finding list and sheet metadata;
//! only `generated_at` depends on the clock. Use [`AuditReport::content_eq`]
//! to compare two reports while ignoring it.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared_types::{Finding, SheetMetadata};

const CONTEXT_MAX_CHARS: usize = 80;

const IMMEDIATE_ACTIONS: [&str; 3] = [
    "Review all **critical** issues - these require immediate attention",
    "Ensure negative responses have proper justifications with ticket numbers if applicable",
    "Follow up with the team member who performed the checks",
];

const FOLLOW_UP_ITEMS: [&str; 3] = [
    "Review warning items for potential issues",
    "Consider adjusting thresholds if warnings are expected behavior",
    "Document any recurring patterns for process improvement",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotStats {
    pub analyzed: usize,
    pub issues: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub systems_checked: usize,
    pub total_findings: usize,
    pub critical: usize,
    pub warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<ScreenshotStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub sheet: String,
    pub system: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub performed_by: Option<String>,
}

impl MetadataRow {
    pub fn new(sheet: &str, metadata: &SheetMetadata) -> Self {
        Self {
            sheet: sheet.to_string(),
            system: metadata.system_name.clone(),
            date: metadata.date.clone(),
            time: metadata.time.clone(),
            performed_by: metadata.performed_by.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Passed,
    Warning,
    Critical,
}

impl SheetStatus {
    fn label(&self) -> &'static str {
        match self {
            SheetStatus::Passed => "[OK]",
            SheetStatus::Warning => "[WARNING]",
            SheetStatus::Critical => "[CRITICAL]",
        }
    }
}

/// Findings for one sheet, criticals and warnings each in arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSection {
    pub sheet: String,
    pub status: SheetStatus,
    pub critical: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl SheetSection {
    fn new(sheet: &str, findings: &[Finding]) -> Self {
        let (critical, warnings): (Vec<Finding>, Vec<Finding>) = findings
            .iter()
            .filter(|f| f.sheet == sheet)
            .cloned()
            .partition(Finding::is_critical);

        let status = if !critical.is_empty() {
            SheetStatus::Critical
        } else if !warnings.is_empty() {
            SheetStatus::Warning
        } else {
            SheetStatus::Passed
        };

        Self {
            sheet: sheet.to_string(),
            status,
            critical,
            warnings,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.critical.len() + self.warnings.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub immediate_actions: Vec<String>,
    pub follow_up: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub document: String,
    pub generated_at: NaiveDateTime,
    pub summary: ExecutiveSummary,
    pub metadata: Vec<MetadataRow>,
    pub sheets: Vec<SheetSection>,
    pub recommendations: Option<Recommendations>,
}

impl AuditReport {
    /// Compose a report stamped with the local time
    pub fn compose(
        document: &str,
        metadata: &[(String, SheetMetadata)],
        findings: &[Finding],
        screenshots: Option<ScreenshotStats>,
    ) -> Self {
        Self::compose_at(
            document,
            metadata,
            findings,
            screenshots,
            chrono::Local::now().naive_local(),
        )
    }

    /// Compose a report.
    ///
    /// `metadata` lists the audited sheets in workbook order. Findings for a
    /// sheet missing from that list still get a section, after the listed
    /// sheets.
    pub fn compose_at(
        document: &str,
        metadata: &[(String, SheetMetadata)],
        findings: &[Finding],
        screenshots: Option<ScreenshotStats>,
        generated_at: NaiveDateTime,
    ) -> Self {
        let critical = findings.iter().filter(|f| f.is_critical()).count();
        let warnings = findings.len() - critical;

        let mut sheet_order: Vec<&str> = metadata.iter().map(|(name, _)| name.as_str()).collect();
        for finding in findings {
            if !sheet_order.contains(&finding.sheet.as_str()) {
                sheet_order.push(&finding.sheet);
            }
        }

        let recommendations = (!findings.is_empty()).then(|| Recommendations {
            immediate_actions: if critical > 0 {
                IMMEDIATE_ACTIONS.iter().map(|s| s.to_string()).collect()
            } else {
                Vec::new()
            },
            follow_up: if warnings > 0 {
                FOLLOW_UP_ITEMS.iter().map(|s| s.to_string()).collect()
            } else {
                Vec::new()
            },
        });

        Self {
            document: document.to_string(),
            generated_at,
            summary: ExecutiveSummary {
                systems_checked: metadata.len(),
                total_findings: findings.len(),
                critical,
                warnings,
                screenshots: screenshots.filter(|s| s.analyzed > 0),
            },
            metadata: metadata
                .iter()
                .map(|(sheet, meta)| MetadataRow::new(sheet, meta))
                .collect(),
            sheets: sheet_order
                .into_iter()
                .map(|sheet| SheetSection::new(sheet, findings))
                .collect(),
            recommendations,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetSection> {
        self.sheets.iter().find(|s| s.sheet == name)
    }

    /// Equality ignoring the generation timestamp
    pub fn content_eq(&self, other: &Self) -> bool {
        self.document == other.document
            && self.summary == other.summary
            && self.metadata == other.metadata
            && self.sheets == other.sheets
            && self.recommendations == other.recommendations
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_markdown(&mut out);
        out
    }

    fn write_markdown(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# Audit Report - {}\n", self.document)?;
        writeln!(
            out,
            "**Generated**: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;

        let summary = &self.summary;
        writeln!(out, "## Executive Summary\n")?;
        writeln!(out, "- **Systems Checked**: {}", summary.systems_checked)?;
        writeln!(out, "- **Total Issues**: {}", summary.total_findings)?;
        writeln!(
            out,
            "- **Critical**: {} | **Warnings**: {}",
            summary.critical, summary.warnings
        )?;
        if let Some(stats) = summary.screenshots {
            writeln!(
                out,
                "- **Screenshots Analyzed**: {} (Issues: {})",
                stats.analyzed, stats.issues
            )?;
        }
        writeln!(out)?;
        if summary.total_findings == 0 {
            writeln!(out, "> **All checks passed validation!**\n")?;
        }

        writeln!(out, "## Check Metadata\n")?;
        writeln!(out, "| System | Date | Time | Performed By |")?;
        writeln!(out, "|--------|------|------|--------------|")?;
        for row in &self.metadata {
            let system = row.system.as_deref().unwrap_or(&row.sheet);
            let date = row
                .date
                .as_deref()
                .map(|d| d.chars().take(10).collect::<String>())
                .unwrap_or_else(|| "N/A".to_string());
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                system,
                date,
                row.time.as_deref().unwrap_or("N/A"),
                row.performed_by.as_deref().unwrap_or("N/A")
            )?;
        }
        writeln!(out)?;

        writeln!(out, "## Per-System Findings\n")?;
        for section in &self.sheets {
            writeln!(out, "### {} {}\n", section.status.label(), section.sheet)?;
            if section.status == SheetStatus::Passed {
                writeln!(out, "All checks passed validation.\n")?;
                continue;
            }

            writeln!(
                out,
                "**Issues Found**: {} ({} critical, {} warnings)\n",
                section.finding_count(),
                section.critical.len(),
                section.warnings.len()
            )?;
            if !section.critical.is_empty() {
                writeln!(out, "#### Critical Issues\n")?;
                write_findings(out, &section.critical)?;
            }
            if !section.warnings.is_empty() {
                writeln!(out, "#### Warnings\n")?;
                write_findings(out, &section.warnings)?;
            }
        }

        if let Some(recommendations) = &self.recommendations {
            writeln!(out, "## Recommendations\n")?;
            if !recommendations.immediate_actions.is_empty() {
                writeln!(out, "### Immediate Actions Required\n")?;
                write_numbered(out, &recommendations.immediate_actions)?;
            }
            if !recommendations.follow_up.is_empty() {
                writeln!(out, "### Follow-up Items\n")?;
                write_numbered(out, &recommendations.follow_up)?;
            }
        }

        Ok(())
    }
}

fn write_findings(out: &mut String, findings: &[Finding]) -> std::fmt::Result {
    for finding in findings {
        writeln!(
            out,
            "- **Row {}** [{}]: {}",
            finding.row, finding.category, finding.message
        )?;
        if let Some(context) = &finding.context {
            writeln!(out, "  - Context: `{}`", truncate_context(context))?;
        }
    }
    writeln!(out)
}

fn write_numbered(out: &mut String, items: &[String]) -> std::fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        writeln!(out, "{}. {}", idx + 1, item)?;
    }
    writeln!(out)
}

fn truncate_context(context: &str) -> String {
    if context.chars().count() > CONTEXT_MAX_CHARS {
        let head: String = context.chars().take(CONTEXT_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        context.to_string()
    }
}
