//! Daily Checks Audit MCP Server Binary
//!
//! Entry point for the MCP server supporting multiple transports.

use std::path::PathBuf;

use checks_audit::{AuditService, Settings};
use clap::Parser;
use mcp_server::AuditMcpServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mcp-server")]
#[command(version, about = "SAP daily checks audit via Model Context Protocol")]
struct Args {
    /// Transport mode: stdio or http
    #[arg(short, long, default_value = "stdio")]
    transport: String,

    /// HTTP server address (only used with http transport)
    #[arg(long, default_value = "127.0.0.1:3000")]
    http_addr: String,

    /// Directory holding customer threshold configurations
    #[arg(long, env = "AUDIT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing - CRITICAL: use stderr for stdio transport
    let use_stderr = args.transport == "stdio";

    if use_stderr {
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Daily Checks Audit MCP Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Transport: {}", args.transport);

    let mut settings = Settings::from_env();
    if let Some(config_dir) = args.config_dir {
        settings = settings.with_config_dir(config_dir);
    }
    tracing::info!("Customer configs: {}", settings.config_dir.display());
    if !settings.vision_enabled() {
        tracing::warn!("Azure OpenAI credentials not set; screenshot validation disabled");
    }

    let server = AuditMcpServer::new(AuditService::new(&settings));

    match args.transport.as_str() {
        "stdio" => {
            mcp_server::transport::stdio::run_stdio_server(server).await?;
        }
        #[cfg(feature = "http")]
        "http" => {
            mcp_server::transport::http::run_http_server(&args.http_addr, server).await?;
        }
        #[cfg(not(feature = "http"))]
        "http" => {
            eprintln!("HTTP transport not enabled. Rebuild with --features http");
            std::process::exit(1);
        }
        other => {
            eprintln!("Unknown transport: {}. Use 'stdio' or 'http'", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
