pub mod justification;
pub mod thresholds;

use shared_types::{CheckCategory, Finding, Row};

use crate::config::CustomerConfig;

/// Per-row evaluation context
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub sheet: &'a str,
    /// 1-indexed spreadsheet row
    pub row_number: u32,
    /// Sticky category in effect for this row
    pub category: Option<CheckCategory>,
    pub config: Option<&'a CustomerConfig>,
}

/// Run both rule families over one row. Findings keep the order
/// justification first, then thresholds in table order.
pub fn evaluate_row(ctx: &RowContext<'_>, row: &Row) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(justification::check_justification(ctx, row));
    findings.extend(thresholds::check_thresholds(ctx, row));
    findings
}
