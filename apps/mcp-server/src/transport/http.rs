//! HTTP transport for MCP
//!
//! JSON-RPC over `POST /mcp`, plus health and info endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ServerError;
use crate::mcp::protocol::*;
use crate::mcp::AuditMcpServer;

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct HttpServerState {
    server: Arc<AuditMcpServer>,
}

pub fn router(server: AuditMcpServer) -> Router {
    let state = HttpServerState {
        server: Arc::new(server),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/mcp", post(handle_mcp_request))
        .route("/health", get(handle_health))
        .route("/", get(handle_info))
        .layer(cors)
        .with_state(state)
}

/// Run the MCP server using HTTP transport
pub async fn run_http_server(addr: &str, server: AuditMcpServer) -> Result<(), ServerError> {
    tracing::info!("Starting HTTP transport on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServerError::IoError)?;

    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, router(server))
        .await
        .map_err(|e| ServerError::IoError(std::io::Error::other(e)))?;

    Ok(())
}

/// Handle MCP JSON-RPC requests
async fn handle_mcp_request(
    State(state): State<HttpServerState>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::debug!("HTTP request: {:?}", request.method);

    match state.server.handle_request(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_info(State(state): State<HttpServerState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "http",
        "endpoints": {
            "mcp": "/mcp",
            "health": "/health"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use checks_audit::{AuditService, Settings};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AuditMcpServer::new(AuditService::new(&Settings::default())))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_mcp(body: serde_json::Value) -> Request<Body> {
        Request::post("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_info() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let info = body_json(response).await;
        assert_eq!(info["name"], "daily-checks-audit");
        assert_eq!(info["endpoints"]["mcp"], "/mcp");
    }

    #[tokio::test]
    async fn test_tools_list_over_http() {
        let response = app()
            .oneshot(post_mcp(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_notification_accepted() {
        let response = app()
            .oneshot(post_mcp(
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
