// Failure counts as typed into the sheet cells
use serde::Serialize;
use shared_types::{Row, Sheet};

/// Reported values for the metrics a screenshot can contradict.
///
/// `None` means the sheet has no row for that metric (or no number on it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportedValues {
    pub failed_data_backup: Option<i64>,
    pub failed_log_backup: Option<i64>,
    pub failed_jobs: Option<i64>,
}

impl ReportedValues {
    /// Scan every row of a sheet, header rows included.
    ///
    /// Backup rows take the first numeric cell, the last matching row
    /// winning. Job-failure rows are summed, since sheets often report
    /// today and yesterday on separate rows.
    pub fn from_sheet(sheet: &Sheet) -> Self {
        let mut values = ReportedValues::default();

        for row in &sheet.rows {
            let text = row.search_text();
            if text.is_empty() {
                continue;
            }

            if text.contains("failed data backup") {
                if let Some(n) = first_number(row) {
                    values.failed_data_backup = Some(n);
                }
            }
            if text.contains("failed log backup") {
                if let Some(n) = first_number(row) {
                    values.failed_log_backup = Some(n);
                }
            }
            if is_job_failure_row(&text) {
                if let Some(n) = first_number(row) {
                    values.failed_jobs = Some(values.failed_jobs.unwrap_or(0).saturating_add(n));
                }
            }
        }

        values
    }

    /// Sum of the metrics the sheet reports explicitly, `None` if it reports
    /// none of them.
    pub fn explicit_failure_total(&self) -> Option<i64> {
        [self.failed_data_backup, self.failed_log_backup, self.failed_jobs]
            .into_iter()
            .flatten()
            .fold(None, |total, n| Some(total.unwrap_or(0).saturating_add(n)))
    }
}

fn is_job_failure_row(text: &str) -> bool {
    (text.contains("failed") && text.contains("job")) || text.contains("number of failed jobs")
}

/// First numeric cell anywhere in the row, truncated to a count
fn first_number(row: &Row) -> Option<i64> {
    row.cells()
        .iter()
        .find_map(|cell| cell.as_number())
        .map(|n| n.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::CellValue;

    fn row(label: &str, value: CellValue) -> Row {
        Row::new(vec![
            CellValue::Empty,
            CellValue::text(label),
            CellValue::Empty,
            value,
        ])
    }

    #[test]
    fn test_backup_values() {
        let sheet = Sheet::new(
            "PRD",
            vec![
                row("Failed data backup", CellValue::Number(0.0)),
                row("Failed log backup", CellValue::Number(1.0)),
            ],
        );
        assert_eq!(
            ReportedValues::from_sheet(&sheet),
            ReportedValues {
                failed_data_backup: Some(0),
                failed_log_backup: Some(1),
                failed_jobs: None,
            }
        );
    }

    #[test]
    fn test_failed_jobs_are_summed() {
        let sheet = Sheet::new(
            "PRD",
            vec![
                row("Number of Failed Jobs: Today", CellValue::Number(2.0)),
                row("Number of Failed Jobs: Yesterday", CellValue::Number(1.0)),
                row("Cancelled jobs", CellValue::Number(9.0)),
            ],
        );
        assert_eq!(ReportedValues::from_sheet(&sheet).failed_jobs, Some(3));
    }

    #[test]
    fn test_huge_job_counts_saturate() {
        let sheet = Sheet::new(
            "PRD",
            vec![
                row("Failed jobs today", CellValue::Number(1e19)),
                row("Failed jobs yesterday", CellValue::Number(1e19)),
            ],
        );
        let values = ReportedValues::from_sheet(&sheet);
        assert_eq!(values.failed_jobs, Some(i64::MAX));

        let all = ReportedValues {
            failed_data_backup: Some(i64::MAX),
            ..values
        };
        assert_eq!(all.explicit_failure_total(), Some(i64::MAX));
    }

    #[test]
    fn test_zero_job_rows_are_explicit() {
        let sheet = Sheet::new("PRD", vec![row("Failed jobs", CellValue::Number(0.0))]);
        assert_eq!(ReportedValues::from_sheet(&sheet).failed_jobs, Some(0));
    }

    #[test]
    fn test_text_values_are_not_counts() {
        let sheet = Sheet::new("PRD", vec![row("Failed data backup", CellValue::text("0"))]);
        assert_eq!(ReportedValues::from_sheet(&sheet).failed_data_backup, None);
    }

    #[test]
    fn test_last_backup_row_wins() {
        let sheet = Sheet::new(
            "PRD",
            vec![
                row("Failed data backup (full)", CellValue::Number(1.0)),
                row("Failed data backup (incremental)", CellValue::Number(4.0)),
            ],
        );
        assert_eq!(ReportedValues::from_sheet(&sheet).failed_data_backup, Some(4));
    }

    #[test]
    fn test_explicit_failure_total() {
        assert_eq!(ReportedValues::default().explicit_failure_total(), None);

        let zeros = ReportedValues {
            failed_data_backup: Some(0),
            failed_log_backup: None,
            failed_jobs: Some(0),
        };
        assert_eq!(zeros.explicit_failure_total(), Some(0));

        let jobs = ReportedValues {
            failed_jobs: Some(3),
            ..zeros
        };
        assert_eq!(jobs.explicit_failure_total(), Some(3));
    }
}
