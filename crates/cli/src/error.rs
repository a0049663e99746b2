//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An input file for `check` could not be used.
    #[error("invalid input {path}: {reason}")]
    Input { path: String, reason: String },

    /// The server answered with a JSON-RPC error.
    #[error("server error: {0}")]
    Rpc(#[from] mcp::JsonRpcError),

    /// The server answered with something that is not a valid MCP response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The evaluation tool reported a failure.
    #[error("evaluation failed: {0}")]
    ToolFailed(String),

    /// An error occurred in the evaluator.
    #[error(transparent)]
    Evaluator(#[from] evaluator::Error),

    /// An error occurred in the MCP layer.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// An HTTP request to the server failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
