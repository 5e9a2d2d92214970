// Negative responses must carry a justification in the status column
use crate::extractors::numeric::{is_negative_response, justification};
use crate::rules::RowContext;
use shared_types::{Finding, FindingCategory, Row};

/// Justifications shorter than this are accepted but flagged as brief
pub const MIN_JUSTIFICATION_CHARS: usize = 10;

/// Check a row answered "N" for a justification
pub fn check_justification(ctx: &RowContext<'_>, row: &Row) -> Vec<Finding> {
    let mut findings = Vec::new();

    if !is_negative_response(row) {
        return findings;
    }

    let category = FindingCategory::from(ctx.category);
    let context = row.snippet(0..4);

    match justification(row) {
        None => {
            findings.push(
                Finding::critical(
                    ctx.sheet,
                    ctx.row_number,
                    category,
                    "Negative (N) response without justification",
                )
                .with_context(context),
            );
        }
        Some(text) if text.chars().count() < MIN_JUSTIFICATION_CHARS => {
            findings.push(
                Finding::warning(
                    ctx.sheet,
                    ctx.row_number,
                    category,
                    format!("Negative response has brief justification: \"{}\"", text),
                )
                .with_context(context),
            );
        }
        Some(_) => {}
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{CellValue, CheckCategory, Severity};

    fn ctx() -> RowContext<'static> {
        RowContext {
            sheet: "PRD",
            row_number: 9,
            category: Some(CheckCategory::SystemLog),
            config: None,
        }
    }

    fn answered(response: &str, status: &str) -> Row {
        Row::new(vec![
            CellValue::text("SM21"),
            CellValue::text("Check system log"),
            CellValue::Empty,
            CellValue::text(response),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::text(status),
        ])
    }

    #[test]
    fn test_missing_justification_is_critical() {
        let findings = check_justification(&ctx(), &answered("N", ""));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].row, 9);
        assert_eq!(
            findings[0].category,
            FindingCategory::Check(CheckCategory::SystemLog)
        );
        assert_eq!(
            findings[0].context.as_deref(),
            Some("SM21 | Check system log |  | N")
        );
    }

    #[test]
    fn test_brief_justification_is_warning() {
        let findings = check_justification(&ctx(), &answered("n", " OK "));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(
            findings[0].message,
            "Negative response has brief justification: \"OK\""
        );
    }

    #[test]
    fn test_adequate_justification_accepted() {
        let findings = check_justification(&ctx(), &answered("N", "INC0012345 opened with basis"));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_positive_response_ignored() {
        assert!(check_justification(&ctx(), &answered("Y", "")).is_empty());
    }

    #[test]
    fn test_unknown_category() {
        let ctx = RowContext {
            category: None,
            ..ctx()
        };
        let findings = check_justification(&ctx, &answered("N", ""));
        assert_eq!(findings[0].category, FindingCategory::Unknown);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 9 characters, 18 bytes
        let findings = check_justification(&ctx(), &answered("N", "ÄÄÄÄÄÄÄÄÄ"));
        assert_eq!(findings[0].severity, Severity::Warning);
    }
}
