//! Tool-call evaluation proxy.
//!
//! This crate forwards a conversation and the tools an agent could use to a
//! remote evaluation backend and returns its verdict. It also exposes that
//! operation as the `evaluate_tool_call` MCP tool.
//!
//! # Overview
//!
//! - **EvaluationRequest**: the tools, the message history and a
//!   [`ModelSize`] selector. Tools and messages are opaque JSON objects.
//! - **Evaluator**: owns the HTTP client and the per-size [`Endpoints`];
//!   makes exactly one POST per evaluation. No retries, no caching.
//! - **EvaluationResult**: a `score` string and a list of reasons.
//! - **EvaluateToolCall**: an [`mcp::ToolHandler`] wrapping an evaluator.
//!
//! # Example
//!
//! ```no_run
//! use evaluator::{EvaluationRequest, Evaluator, ModelSize};
//! use serde_json::json;
//!
//! # async fn example() -> evaluator::Result<()> {
//! let evaluator = Evaluator::builder().build()?;
//!
//! let tools = vec![json!({"name": "search_web", "description": "Search the web"})
//!     .as_object()
//!     .cloned()
//!     .unwrap()];
//! let history = vec![json!({"role": "user", "content": "Find Python tutorials"})
//!     .as_object()
//!     .cloned()
//!     .unwrap()];
//!
//! let request = EvaluationRequest::with_model_size(tools, history, ModelSize::Small);
//! let result = evaluator.evaluate(&request).await?;
//! println!("{}: {:?}", result.score, result.reason);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod model_size;
mod tool;
mod types;

pub use client::{DEFAULT_TIMEOUT, Evaluator, EvaluatorBuilder};
pub use error::{Error, ErrorKind, Result};
pub use model_size::{Endpoints, ModelSize};
pub use tool::{EvaluateToolCall, TOOL_NAME};
pub use types::{ConversationMessage, EvaluationRequest, EvaluationResult, Score, ToolDefinition};
