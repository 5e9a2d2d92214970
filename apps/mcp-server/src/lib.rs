//! Daily Checks Audit MCP Server
//!
//! A Model Context Protocol server exposing the daily checks audit and the
//! screenshot cross-validation as tools for MCP-compliant AI agents.

pub mod error;
pub mod mcp;
pub mod transport;

pub use error::ServerError;
pub use mcp::server::AuditMcpServer;
