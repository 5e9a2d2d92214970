//! Row classification by transaction code and check label
//!
//! Daily checks sheets open each block with a header row naming the SAP
//! transaction (SM37, ST22, ...) or describing the check, followed by data
//! rows that do not repeat the label. Patterns are tried in
//! [`CheckCategory::ALL`] order and the first match wins.

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{CheckCategory, Row};

lazy_static! {
    static ref CATEGORY_PATTERNS: Vec<(CheckCategory, Regex)> = vec![
        (
            CheckCategory::ServerAvailability,
            Regex::new(r"(?i)SM51|application server.*running").unwrap(),
        ),
        (
            CheckCategory::WorkProcess,
            Regex::new(r"(?i)SM50|SM66|work process").unwrap(),
        ),
        (
            CheckCategory::ResponseTime,
            Regex::new(r"(?i)SMLG|response time").unwrap(),
        ),
        (
            CheckCategory::SystemLog,
            Regex::new(r"(?i)SM21|system log").unwrap(),
        ),
        (
            CheckCategory::JobMonitor,
            Regex::new(r"(?i)SM37|cancelled.*job|failed.*job").unwrap(),
        ),
        (
            CheckCategory::LockMonitor,
            Regex::new(r"(?i)SM12|old lock").unwrap(),
        ),
        (
            CheckCategory::DumpMonitor,
            Regex::new(r"(?i)ST22|abap.*dump").unwrap(),
        ),
        (
            CheckCategory::DatabasePerformance,
            Regex::new(r"(?i)DBACOCKPIT|database.*performance").unwrap(),
        ),
        (
            CheckCategory::UpdateMonitor,
            Regex::new(r"(?i)SM13|update.*monitoring|failed update").unwrap(),
        ),
        (
            CheckCategory::BufferMonitor,
            Regex::new(r"(?i)ST02|buffer").unwrap(),
        ),
        (
            CheckCategory::WorkloadMonitor,
            Regex::new(r"(?i)ST03N|workload.*monitoring").unwrap(),
        ),
        (
            CheckCategory::SpoolMonitor,
            Regex::new(r"(?i)SPAD|spool").unwrap(),
        ),
        (
            CheckCategory::RfcMonitor,
            Regex::new(r"(?i)SM58|trfc").unwrap(),
        ),
        (
            CheckCategory::MailMonitor,
            Regex::new(r"(?i)SOST|failed.*email").unwrap(),
        ),
        (
            CheckCategory::ServerStatus,
            Regex::new(r"(?i)CMC|server.*status").unwrap(),
        ),
        (
            CheckCategory::SystemOverview,
            Regex::new(r"(?i)NWA|system overview").unwrap(),
        ),
    ];
}

/// Classify already-lowercased row text
pub fn classify_text(text: &str) -> Option<CheckCategory> {
    CATEGORY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(category, _)| *category)
}

/// Classify a single row, ignoring any previous rows
pub fn classify(row: &Row) -> Option<CheckCategory> {
    classify_text(&row.search_text())
}

/// Carry the last recognised category forward over unlabeled rows
pub fn sticky(current: Option<CheckCategory>, row: &Row) -> Option<CheckCategory> {
    classify(row).or(current)
}

/// Classify a run of rows, with unlabeled rows inheriting the category of
/// the last labeled row before them.
pub fn classify_sticky<'a, I>(rows: I) -> Vec<Option<CheckCategory>>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .scan(None, |current, row| {
            *current = sticky(*current, row);
            Some(*current)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::CellValue;

    fn row(cells: &[&str]) -> Row {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_every_category_has_a_pattern() {
        let covered: Vec<CheckCategory> = CATEGORY_PATTERNS.iter().map(|(c, _)| *c).collect();
        assert_eq!(covered, CheckCategory::ALL.to_vec());
    }

    #[test]
    fn test_classify_transaction_codes() {
        assert_eq!(classify(&row(&["SM51"])), Some(CheckCategory::ServerAvailability));
        assert_eq!(classify(&row(&["", "ST22 - ABAP Dumps"])), Some(CheckCategory::DumpMonitor));
        assert_eq!(classify(&row(&["sm58", "tRFC"])), Some(CheckCategory::RfcMonitor));
        assert_eq!(classify(&row(&["DBACOCKPIT"])), Some(CheckCategory::DatabasePerformance));
    }

    #[test]
    fn test_classify_descriptions() {
        assert_eq!(
            classify(&row(&["Check that application server is running"])),
            Some(CheckCategory::ServerAvailability)
        );
        assert_eq!(
            classify(&row(&["Number of old locks"])),
            Some(CheckCategory::LockMonitor)
        );
        assert_eq!(
            classify(&row(&["Spool requests in error"])),
            Some(CheckCategory::SpoolMonitor)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // "failed update" would be update-monitor, but "failed ... job" is
        // tested earlier.
        assert_eq!(
            classify(&row(&["failed update job"])),
            Some(CheckCategory::JobMonitor)
        );
    }

    #[test]
    fn test_unrecognised_row() {
        assert_eq!(classify(&row(&["", "Y", "", "0"])), None);
        assert_eq!(classify(&Row::default()), None);
    }

    #[test]
    fn test_numbers_take_part_in_row_text() {
        let labeled = Row::new(vec![CellValue::text("ST"), CellValue::Number(22.0)]);
        assert_eq!(classify(&labeled), None);

        let code = Row::new(vec![CellValue::text("Transaction"), CellValue::text("SM37")]);
        assert_eq!(classify(&code), Some(CheckCategory::JobMonitor));
    }

    #[test]
    fn test_sticky_classification() {
        let rows = vec![
            row(&["SM37 failed job header"]),
            row(&["", "", "", "Y"]),
            row(&["", "", "", "3"]),
            row(&["ST22"]),
            row(&["", "", "", "N"]),
        ];

        assert_eq!(
            classify_sticky(&rows),
            vec![
                Some(CheckCategory::JobMonitor),
                Some(CheckCategory::JobMonitor),
                Some(CheckCategory::JobMonitor),
                Some(CheckCategory::DumpMonitor),
                Some(CheckCategory::DumpMonitor),
            ]
        );
    }

    #[test]
    fn test_sticky_starts_unclassified() {
        let rows = vec![row(&["", "Y"]), row(&["SM12"])];
        assert_eq!(
            classify_sticky(&rows),
            vec![None, Some(CheckCategory::LockMonitor)]
        );
    }
}
