//! MCP (Model Context Protocol) server library.
//!
//! This crate provides the JSON-RPC 2.0 message types of MCP and a [`Server`]
//! that answers `initialize`, `ping`, `tools/list` and `tools/call` using a
//! [`ToolHandler`]. The server is transport-agnostic: feed it raw messages
//! with [`Server::handle_message`], or run it over stdio.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, Server, Tool, ToolHandler};
//! use serde_json::{Value, json};
//!
//! struct Hello;
//!
//! impl ToolHandler for Hello {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool {
//!             name: "hello".to_string(),
//!             description: Some("Say hello".to_string()),
//!             input_schema: json!({"type": "object"}),
//!             output_schema: None,
//!         }]
//!     }
//!
//!     async fn call(&self, name: &str, _arguments: Option<Value>) -> mcp::Result<CallToolResult> {
//!         match name {
//!             "hello" => Ok(CallToolResult::structured(json!({"greeting": "hello"}))),
//!             other => Err(mcp::Error::ToolNotFound(other.to_string())),
//!         }
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! let server = Server::new("hello-server", "0.1.0", Hello);
//! server.serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult,
    RequestId, ServerCapabilities, Tool, ToolContent, ToolsCapability, error_codes,
};
pub use server::{MAX_MESSAGE_SIZE, Server, ToolHandler};
