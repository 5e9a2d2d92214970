use std::fmt;

/// Operational monitoring topic a check row belongs to.
///
/// Declaration order is significant: the row classifier tests categories in
/// exactly this order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckCategory {
    ServerAvailability,
    WorkProcess,
    ResponseTime,
    SystemLog,
    JobMonitor,
    LockMonitor,
    DumpMonitor,
    DatabasePerformance,
    UpdateMonitor,
    BufferMonitor,
    WorkloadMonitor,
    SpoolMonitor,
    RfcMonitor,
    MailMonitor,
    ServerStatus,
    SystemOverview,
}

impl CheckCategory {
    /// All categories in classification order
    pub const ALL: [CheckCategory; 16] = [
        CheckCategory::ServerAvailability,
        CheckCategory::WorkProcess,
        CheckCategory::ResponseTime,
        CheckCategory::SystemLog,
        CheckCategory::JobMonitor,
        CheckCategory::LockMonitor,
        CheckCategory::DumpMonitor,
        CheckCategory::DatabasePerformance,
        CheckCategory::UpdateMonitor,
        CheckCategory::BufferMonitor,
        CheckCategory::WorkloadMonitor,
        CheckCategory::SpoolMonitor,
        CheckCategory::RfcMonitor,
        CheckCategory::MailMonitor,
        CheckCategory::ServerStatus,
        CheckCategory::SystemOverview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCategory::ServerAvailability => "server-availability",
            CheckCategory::WorkProcess => "work-process",
            CheckCategory::ResponseTime => "response-time",
            CheckCategory::SystemLog => "system-log",
            CheckCategory::JobMonitor => "job-monitor",
            CheckCategory::LockMonitor => "lock-monitor",
            CheckCategory::DumpMonitor => "dump-monitor",
            CheckCategory::DatabasePerformance => "database-performance",
            CheckCategory::UpdateMonitor => "update-monitor",
            CheckCategory::BufferMonitor => "buffer-monitor",
            CheckCategory::WorkloadMonitor => "workload-monitor",
            CheckCategory::SpoolMonitor => "spool-monitor",
            CheckCategory::RfcMonitor => "rfc-monitor",
            CheckCategory::MailMonitor => "mail-monitor",
            CheckCategory::ServerStatus => "server-status",
            CheckCategory::SystemOverview => "system-overview",
        }
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category label attached to a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "category")]
pub enum FindingCategory {
    /// Row-scoped finding with a classified check
    Check(CheckCategory),
    /// Row-scoped finding before any category was recognised
    Unknown,
    /// Screenshot reconciliation finding (not row-scoped)
    ScreenshotValidation,
}

impl From<Option<CheckCategory>> for FindingCategory {
    fn from(category: Option<CheckCategory>) -> Self {
        category.map_or(FindingCategory::Unknown, FindingCategory::Check)
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Check(category) => category.fmt(f),
            FindingCategory::Unknown => f.write_str("unknown"),
            FindingCategory::ScreenshotValidation => f.write_str("screenshot-validation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit finding. Never mutated once pushed into a finding list.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub sheet: String,
    pub row: u32, // 1-indexed sheet row, 0 when not row-scoped
    pub category: FindingCategory,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Finding {
    pub fn new(
        sheet: impl Into<String>,
        row: u32,
        category: FindingCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            category,
            severity,
            message: message.into(),
            context: None,
        }
    }

    pub fn critical(
        sheet: impl Into<String>,
        row: u32,
        category: FindingCategory,
        message: impl Into<String>,
    ) -> Self {
        Self::new(sheet, row, category, Severity::Critical, message)
    }

    pub fn warning(
        sheet: impl Into<String>,
        row: u32,
        category: FindingCategory,
        message: impl Into<String>,
    ) -> Self {
        Self::new(sheet, row, category, Severity::Warning, message)
    }

    /// Attach a context snippet (empty snippets are dropped)
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.is_empty() { None } else { Some(context) };
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} Row {}: {}",
            self.severity.as_str().to_uppercase(),
            self.sheet,
            self.row,
            self.message
        )
    }
}
