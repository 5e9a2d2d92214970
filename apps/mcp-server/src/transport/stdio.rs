//! Standard I/O transport for MCP
//!
//! IMPORTANT: All logging MUST go to stderr. stdout is reserved for
//! JSON-RPC protocol messages only.

use std::io::{BufRead, Write};

use crate::error::ServerError;
use crate::mcp::protocol::*;
use crate::mcp::AuditMcpServer;

/// Run the MCP server using stdio transport
pub async fn run_stdio_server(server: AuditMcpServer) -> Result<(), ServerError> {
    tracing::info!("Starting stdio transport");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    let mut stdin_lock = stdin.lock();
    let mut stdout_lock = stdout.lock();

    loop {
        let request = match read_message(&mut stdin_lock) {
            Ok(Some(req)) => req,
            Ok(None) => {
                tracing::info!("EOF reached, shutting down");
                break;
            }
            Err(e) => {
                tracing::error!("Failed to read message: {}", e);
                continue;
            }
        };

        tracing::debug!("Received request: {:?}", request.method);

        let Some(response) = server.handle_request(request).await else {
            continue;
        };

        if let Err(e) = write_message(&mut stdout_lock, &response) {
            tracing::error!("Failed to write response: {}", e);
        }
    }

    Ok(())
}

/// Read a JSON-RPC message from the input stream
fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<JsonRpcRequest>, ServerError> {
    let mut header = String::new();
    if reader.read_line(&mut header)? == 0 {
        return Ok(None); // EOF
    }

    let header = header.trim();
    if header.is_empty() {
        return Ok(None);
    }

    let content_length: usize = match header.strip_prefix("Content-Length:") {
        Some(length) => length
            .trim()
            .parse()
            .map_err(|_| ServerError::ProtocolError("Invalid Content-Length".to_string()))?,
        None => {
            return Err(ServerError::ProtocolError(format!(
                "Expected Content-Length header, got: {}",
                header
            )))
        }
    };

    // Skip empty line after headers
    let mut empty = String::new();
    reader.read_line(&mut empty)?;

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    let request: JsonRpcRequest = serde_json::from_slice(&body)?;
    Ok(Some(request))
}

/// Write a JSON-RPC message to the output stream
fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), ServerError> {
    let body = serde_json::to_string(response)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());

    writer.write_all(header.as_bytes())?;
    writer.write_all(body.as_bytes())?;
    writer.flush()?;

    Ok(())
}
