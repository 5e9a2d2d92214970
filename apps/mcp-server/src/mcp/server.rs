//! MCP Server core implementation

use checks_audit::AuditService;
use serde_json::{json, Value};

use super::protocol::*;
use super::tools;

pub const SERVER_NAME: &str = "daily-checks-audit";

/// The Daily Checks Audit MCP server
#[derive(Clone)]
pub struct AuditMcpServer {
    name: String,
    version: String,
    service: AuditService,
}

impl AuditMcpServer {
    pub fn new(service: AuditService) -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn service(&self) -> &AuditService {
        &self.service
    }

    /// Dispatch one JSON-RPC request. Notifications yield no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tools::get_tool_definitions() })),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        };

        JsonRpcResponse::serialized(id, &result)
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match tools::handle_tool_call(&self.service, name, arguments).await {
            Ok(content) => JsonRpcResponse::success(
                id,
                json!({
                    "content": content,
                    "isError": false
                }),
            ),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{"type": "text", "text": format!("Error: {}", e)}],
                        "isError": true
                    }),
                )
            }
        }
    }
}
