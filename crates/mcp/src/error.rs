//! MCP error types.

use crate::protocol::{JsonRpcError, error_codes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

impl Error {
    /// JSON-RPC error object reported to the peer for this error.
    pub fn to_json_rpc(&self) -> JsonRpcError {
        let code = match self {
            Error::InvalidParams(_) | Error::ToolNotFound(_) => error_codes::INVALID_PARAMS,
            Error::MessageTooLarge { .. } => error_codes::INVALID_REQUEST,
            Error::Io(_) | Error::Serialize(_) | Error::ToolCallFailed(_) => {
                error_codes::INTERNAL_ERROR
            }
        };
        JsonRpcError::new(code, self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
