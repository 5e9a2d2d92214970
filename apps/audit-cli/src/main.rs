//! Daily Checks Audit CLI
//!
//! Audits one SAP daily monitoring workbook, prints a summary, and writes the
//! Markdown report next to the input (or to `--output`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use checks_audit::{AuditOutcome, AuditService, Settings};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "daily-checks-audit")]
#[command(version, about = "Audit an SAP daily monitoring Excel workbook", long_about = None)]
struct Cli {
    /// Workbook to audit
    excel_path: PathBuf,

    /// Directory holding customer threshold configurations
    #[arg(long, env = "AUDIT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Skip screenshot cross-validation
    #[arg(long)]
    no_screenshots: bool,

    /// Report file (default: audit_report_<timestamp>.md beside the workbook)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not echo the full report after the summary
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = Settings::from_env();
    if let Some(config_dir) = cli.config_dir {
        settings = settings.with_config_dir(config_dir);
    }
    let include_screenshots = !cli.no_screenshots;
    if include_screenshots && !settings.vision_enabled() {
        tracing::warn!("Azure OpenAI credentials not set; screenshots will not be analyzed");
    }

    let service = AuditService::new(&settings);
    let outcome = service
        .audit(&cli.excel_path, include_screenshots)
        .await
        .with_context(|| format!("Audit of {} failed", cli.excel_path.display()))?;

    let markdown = outcome.report.to_markdown();
    let report_path = cli
        .output
        .unwrap_or_else(|| default_report_path(&cli.excel_path, outcome.report.generated_at));
    std::fs::write(&report_path, &markdown)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;

    print!("{}", summary(&outcome));
    println!("\nReport saved to: {}", report_path.display());

    if !cli.quiet {
        println!("\n{}", "=".repeat(60));
        println!("{}", markdown);
    }

    Ok(())
}

/// `audit_report_<YYYYmmdd_HHMMSS>.md` in the workbook's directory
fn default_report_path(excel_path: &Path, generated_at: NaiveDateTime) -> PathBuf {
    let file_name = format!("audit_report_{}.md", generated_at.format("%Y%m%d_%H%M%S"));
    match excel_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn summary(outcome: &AuditOutcome) -> String {
    let summary = &outcome.report.summary;
    let mut lines = vec![
        "Audit Results:".to_string(),
        format!("   Critical: {}", summary.critical),
        format!("   Warnings: {}", summary.warnings),
    ];
    if let Some(stats) = outcome.screenshot_stats().filter(|s| s.analyzed > 0) {
        lines.push(format!(
            "   Screenshots Analyzed: {} (Issues: {})",
            stats.analyzed, stats.issues
        ));
    }
    lines.push(format!("   Total Issues: {}", summary.total_findings));
    lines.join("\n") + "\n"
}
