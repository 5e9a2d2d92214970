//! MCP Tool definitions and handlers

use std::path::Path;

use checks_audit::AuditService;
use serde::Deserialize;
use serde_json::json;

use super::protocol::{Tool, ToolResultContent};
use crate::error::ServerError;

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "audit_daily_checks".to_string(),
            description: Some(
                "Audit an SAP daily monitoring Excel workbook and return a Markdown report"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "excel_path": {
                        "type": "string",
                        "description": "Absolute path to the Excel file to audit"
                    },
                    "include_screenshots": {
                        "type": "boolean",
                        "default": false,
                        "description": "Also cross-check embedded screenshots with the vision service"
                    }
                },
                "required": ["excel_path"]
            }),
        },
        Tool {
            name: "validate_screenshots".to_string(),
            description: Some(
                "Validate embedded screenshots against reported cell values using vision analysis"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "excel_path": {
                        "type": "string",
                        "description": "Absolute path to the Excel file"
                    }
                },
                "required": ["excel_path"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct AuditArgs {
    excel_path: String,
    #[serde(default)]
    include_screenshots: bool,
}

#[derive(Debug, Deserialize)]
struct ValidateArgs {
    excel_path: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(args: serde_json::Value) -> Result<T, ServerError> {
    serde_json::from_value(args).map_err(|e| ServerError::InvalidArgument(e.to_string()))
}

/// Handle a tool call
pub async fn handle_tool_call(
    service: &AuditService,
    name: &str,
    arguments: serde_json::Value,
) -> Result<Vec<ToolResultContent>, ServerError> {
    match name {
        "audit_daily_checks" => handle_audit(service, parse_args(arguments)?).await,
        "validate_screenshots" => handle_validate(service, parse_args(arguments)?).await,
        _ => Err(ServerError::UnknownTool(name.to_string())),
    }
}

async fn handle_audit(
    service: &AuditService,
    args: AuditArgs,
) -> Result<Vec<ToolResultContent>, ServerError> {
    let outcome = service
        .audit(Path::new(&args.excel_path), args.include_screenshots)
        .await?;

    Ok(vec![ToolResultContent::Text {
        text: outcome.report.to_markdown(),
    }])
}

async fn handle_validate(
    service: &AuditService,
    args: ValidateArgs,
) -> Result<Vec<ToolResultContent>, ServerError> {
    let run = service.validate_screenshots(Path::new(&args.excel_path)).await?;

    Ok(vec![ToolResultContent::Text { text: run.to_text() }])
}
