// Numeric threshold rules keyed on row text
use crate::config::{threshold, CustomerConfig};
use crate::extractors::numeric::{extract_numeric_value, justification};
use crate::rules::RowContext;
use shared_types::{format_number, CheckCategory, Finding, FindingCategory, Row, Severity};

/// How a reported value is compared against its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Value must stay at or below a configurable limit
    Below,
    /// Value must equal a fixed expected count; anything above it fires
    Exactly,
}

/// A named metric with its default limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleThreshold {
    pub metric: &'static str,
    pub default_limit: f64,
    pub comparison: Comparison,
    pub severity: Severity,
}

impl RuleThreshold {
    /// Effective limit; only `Below` limits can be overridden
    pub fn limit(&self, config: Option<&CustomerConfig>) -> f64 {
        match self.comparison {
            Comparison::Below => threshold(config, self.metric, self.default_limit),
            Comparison::Exactly => self.default_limit,
        }
    }

    pub fn is_violated(&self, value: f64, limit: f64) -> bool {
        value > limit
    }
}

/// Threshold rule with its row-text trigger
pub struct ThresholdRule {
    pub threshold: RuleThreshold,
    pub category: CheckCategory,
    /// Fires when every keyword of any one group occurs in the row text
    pub triggers: &'static [&'static [&'static str]],
    /// Suppressed when the status column carries any text
    pub suppressed_by_justification: bool,
    message: fn(f64, f64) -> String,
    context: Option<std::ops::Range<usize>>,
}

impl ThresholdRule {
    pub fn matches(&self, row_text: &str) -> bool {
        self.triggers
            .iter()
            .any(|group| group.iter().all(|keyword| row_text.contains(keyword)))
    }
}

fn count(value: f64) -> i64 {
    value.trunc() as i64
}

fn response_time_message(value: f64, limit: f64) -> String {
    format!(
        "Response time {}ms exceeds {}ms threshold",
        format_number(value),
        format_number(limit)
    )
}

fn dumps_today_message(value: f64, limit: f64) -> String {
    format!(
        "High dump count today: {} (threshold: {})",
        count(value),
        format_number(limit)
    )
}

fn dumps_yesterday_message(value: f64, limit: f64) -> String {
    format!(
        "High dump count yesterday: {} (threshold: {})",
        count(value),
        format_number(limit)
    )
}

fn failed_updates_message(value: f64, _: f64) -> String {
    format!("Failed updates detected: {}", count(value))
}

fn trfc_errors_message(value: f64, _: f64) -> String {
    format!("tRFC errors detected: {}", count(value))
}

fn old_locks_message(value: f64, _: f64) -> String {
    format!("Old locks present ({}) without explanation", count(value))
}

/// All threshold rules in evaluation order
pub static THRESHOLD_RULES: [ThresholdRule; 6] = [
    ThresholdRule {
        threshold: RuleThreshold {
            metric: "response_time_smlg",
            default_limit: 1000.0,
            comparison: Comparison::Below,
            severity: Severity::Warning,
        },
        category: CheckCategory::ResponseTime,
        triggers: &[&["resp time"]],
        suppressed_by_justification: false,
        message: response_time_message,
        context: Some(1..4),
    },
    ThresholdRule {
        threshold: RuleThreshold {
            metric: "dump_count_today",
            default_limit: 50.0,
            comparison: Comparison::Below,
            severity: Severity::Warning,
        },
        category: CheckCategory::DumpMonitor,
        triggers: &[&["dump", "today"]],
        suppressed_by_justification: false,
        message: dumps_today_message,
        context: None,
    },
    ThresholdRule {
        threshold: RuleThreshold {
            metric: "dump_count_yesterday",
            default_limit: 100.0,
            comparison: Comparison::Below,
            severity: Severity::Warning,
        },
        category: CheckCategory::DumpMonitor,
        triggers: &[&["dump", "yesterday"]],
        suppressed_by_justification: false,
        message: dumps_yesterday_message,
        context: None,
    },
    ThresholdRule {
        threshold: RuleThreshold {
            metric: "failed_updates",
            default_limit: 0.0,
            comparison: Comparison::Exactly,
            severity: Severity::Critical,
        },
        category: CheckCategory::UpdateMonitor,
        triggers: &[&["failed update"]],
        suppressed_by_justification: false,
        message: failed_updates_message,
        context: None,
    },
    ThresholdRule {
        threshold: RuleThreshold {
            metric: "trfc_errors",
            default_limit: 0.0,
            comparison: Comparison::Exactly,
            severity: Severity::Critical,
        },
        category: CheckCategory::RfcMonitor,
        triggers: &[&["cpicerr"], &["sysfail"]],
        suppressed_by_justification: false,
        message: trfc_errors_message,
        context: None,
    },
    ThresholdRule {
        threshold: RuleThreshold {
            metric: "old_locks",
            default_limit: 0.0,
            comparison: Comparison::Exactly,
            severity: Severity::Warning,
        },
        category: CheckCategory::LockMonitor,
        triggers: &[&["old lock"], &["number of old locks"]],
        suppressed_by_justification: true,
        message: old_locks_message,
        context: None,
    },
];

/// Evaluate every threshold rule against a row's first numeric value.
///
/// Rows without a parseable value produce no findings.
pub fn check_thresholds(ctx: &RowContext<'_>, row: &Row) -> Vec<Finding> {
    let mut findings = Vec::new();

    let Some((value, _column)) = extract_numeric_value(row) else {
        return findings;
    };
    let row_text = row.search_text();

    for rule in THRESHOLD_RULES.iter().filter(|r| r.matches(&row_text)) {
        let limit = rule.threshold.limit(ctx.config);
        if !rule.threshold.is_violated(value, limit) {
            continue;
        }
        if rule.suppressed_by_justification && justification(row).is_some() {
            tracing::debug!(
                "{} row {}: {} explained by status text",
                ctx.sheet,
                ctx.row_number,
                rule.threshold.metric
            );
            continue;
        }

        let mut finding = Finding::new(
            ctx.sheet,
            ctx.row_number,
            FindingCategory::Check(rule.category),
            rule.threshold.severity,
            (rule.message)(value, limit),
        );
        if let Some(columns) = rule.context.clone() {
            finding = finding.with_context(row.snippet(columns));
        }
        findings.push(finding);
    }

    findings
}
