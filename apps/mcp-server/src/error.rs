use thiserror::Error;

/// Server-side errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error(transparent)]
    Audit(#[from] checks_audit::AuditError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
