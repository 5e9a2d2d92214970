use std::path::Path;
use std::sync::Arc;

use audit_engine::{AuditEngine, AuditReport, ConfigResolver, ScreenshotStats, WorkbookAudit};
use screenshot_validator::{AzureVisionClient, ScreenshotValidator, ValidationRun, VisionBackend};
use shared_types::Workbook;

use crate::{AuditError, Settings};

/// Everything produced by one audit run
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// Detected customer key, if any
    pub customer: Option<&'static str>,
    /// Rule findings plus screenshot findings when they ran
    pub audit: WorkbookAudit,
    pub screenshots: Option<ValidationRun>,
    pub report: AuditReport,
}

impl AuditOutcome {
    pub fn screenshot_stats(&self) -> Option<ScreenshotStats> {
        self.screenshots.as_ref().map(stats)
    }
}

fn stats(run: &ValidationRun) -> ScreenshotStats {
    ScreenshotStats {
        analyzed: run.analyzed(),
        issues: run.issues.len(),
    }
}

/// Audit pipeline shared by the CLI and the MCP tools
#[derive(Clone)]
pub struct AuditService {
    resolver: ConfigResolver,
    validator: ScreenshotValidator,
}

impl AuditService {
    pub fn new(settings: &Settings) -> Self {
        let backend = settings.azure.clone().map(|config| {
            tracing::info!("Vision backend: Azure OpenAI deployment {}", config.deployment);
            Arc::new(AzureVisionClient::new(config)) as Arc<dyn VisionBackend>
        });

        let validator = ScreenshotValidator::new(backend)
            .with_max_concurrency(settings.vision_max_concurrency)
            .with_timeout(settings.vision_timeout);

        Self::with_validator(ConfigResolver::new(&settings.config_dir), validator)
    }

    pub fn with_validator(resolver: ConfigResolver, validator: ScreenshotValidator) -> Self {
        Self {
            resolver,
            validator,
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Load a workbook on the blocking pool
    pub async fn load(&self, path: &Path) -> Result<Workbook, AuditError> {
        if !path.exists() {
            return Err(AuditError::NotFound(path.to_path_buf()));
        }

        let owned = path.to_path_buf();
        let workbook = tokio::task::spawn_blocking(move || shared_xlsx::load_workbook(&owned)).await??;
        Ok(workbook)
    }

    /// Run the full audit.
    ///
    /// Any input error (missing file, unreadable workbook, malformed customer
    /// config) aborts the run before a report is composed.
    pub async fn audit(&self, path: &Path, include_screenshots: bool) -> Result<AuditOutcome, AuditError> {
        tracing::info!("Auditing: {}", path.display());

        if !path.exists() {
            return Err(AuditError::NotFound(path.to_path_buf()));
        }

        let identifier = path.to_string_lossy();
        let customer = audit_engine::config::detect_customer(&identifier);
        let config = self.resolver.resolve(&identifier)?;

        let workbook = self.load(path).await?;
        let mut audit = AuditEngine::with_config(config).audit_workbook(&workbook);

        let screenshots = if include_screenshots {
            let run = self.validator.validate(&workbook).await;
            audit.append_findings(run.findings());
            Some(run)
        } else {
            None
        };

        let report = audit.report(screenshots.as_ref().map(stats));

        Ok(AuditOutcome {
            customer,
            audit,
            screenshots,
            report,
        })
    }

    pub async fn validate_screenshots(&self, path: &Path) -> Result<ValidationRun, AuditError> {
        let workbook = self.load(path).await?;
        Ok(self.validator.validate(&workbook).await)
    }
}
