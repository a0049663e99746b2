//! MCP server: request dispatch and the stdio transport.

use std::future::Future;

use serde_json::{Value, json};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult,
    ServerCapabilities, Tool, ToolsCapability, error_codes,
};

/// Maximum size of a single incoming message (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Trait for the tools a server exposes.
///
/// Returning [`Error::ToolCallFailed`] from `call` reports a tool-level
/// failure (`isError: true`); any other error becomes a JSON-RPC error.
pub trait ToolHandler: Send + Sync {
    /// Tools advertised by tools/list.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> impl Future<Output = Result<CallToolResult>> + Send;
}

/// An MCP server answering JSON-RPC messages with a [`ToolHandler`].
pub struct Server<H> {
    info: Implementation,
    handler: H,
}

impl<H: ToolHandler> Server<H> {
    pub fn new(name: impl Into<String>, version: impl Into<String>, handler: H) -> Self {
        Self {
            info: Implementation {
                name: name.into(),
                version: Some(version.into()),
            },
            handler,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Handle one raw JSON-RPC message.
    ///
    /// Returns `None` when the message was a notification.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        if message.len() > MAX_MESSAGE_SIZE {
            let error = Error::MessageTooLarge {
                size: message.len(),
                max: MAX_MESSAGE_SIZE,
            };
            warn!(%error, "rejecting message");
            return Some(JsonRpcResponse::failure(None, error.to_json_rpc()));
        }

        match serde_json::from_str::<JsonRpcRequest>(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(error_codes::PARSE_ERROR, format!("parse error: {e}")),
                ))
            }
        }
    }

    /// Handle one decoded request.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let id = request.id;
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    error_codes::INVALID_REQUEST,
                    format!("unsupported jsonrpc version: {}", request.jsonrpc),
                ),
            ));
        }

        debug!(method = %request.method, "request");
        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        };
        Some(response)
    }

    /// Serve newline-delimited JSON-RPC until `reader` reaches EOF.
    ///
    /// Lines longer than [`MAX_MESSAGE_SIZE`] or not valid UTF-8 are answered
    /// with an error and skipped; only I/O failures end the loop.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let limit = MAX_MESSAGE_SIZE as u64 + 1;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if (&mut reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
                debug!("input closed");
                return Ok(());
            }

            if buf.len() > MAX_MESSAGE_SIZE && buf.last() != Some(&b'\n') {
                let skipped = skip_line(&mut reader).await?;
                let error = Error::MessageTooLarge {
                    size: buf.len() + skipped,
                    max: MAX_MESSAGE_SIZE,
                };
                warn!(%error, "rejecting message");
                let response = JsonRpcResponse::failure(None, error.to_json_rpc());
                write_response(&mut writer, &response).await?;
                continue;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_message(line.trim()).await,
                Err(e) => {
                    warn!(error = %e, "message is not valid UTF-8");
                    Some(JsonRpcResponse::failure(
                        None,
                        JsonRpcError::new(error_codes::PARSE_ERROR, format!("parse error: {e}")),
                    ))
                }
            };
            if let Some(response) = response {
                write_response(&mut writer, &response).await?;
            }
        }
    }

    /// Serve over the process's stdin and stdout.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    // --- Internal methods ---

    async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => to_result(ListToolsResult {
                tools: self.handler.tools(),
            }),
            "tools/call" => self.call_tool(params).await,
            other => Err(JsonRpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }

    fn initialize(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: Option<InitializeParams> = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| Error::InvalidParams(e.to_string()).to_json_rpc())?;

        let protocol_version = params
            .and_then(|p| p.protocol_version)
            .unwrap_or_else(|| LATEST_PROTOCOL_VERSION.to_string());

        to_result(InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.info.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| Error::InvalidParams("missing tools/call params".to_string()))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| Error::InvalidParams(e.to_string()))
            })
            .map_err(|e| e.to_json_rpc())?;

        match self.handler.call(&params.name, params.arguments).await {
            Ok(result) => to_result(result),
            Err(Error::ToolCallFailed(message)) => to_result(CallToolResult::error(message)),
            Err(e) => Err(e.to_json_rpc()),
        }
    }
}

/// Discard input up to and including the next newline, returning the byte count.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<usize> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        let (consumed, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        reader.consume(consumed);
        skipped += consumed;
        if done {
            return Ok(skipped);
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let response_json = serde_json::to_string(response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

fn to_result(value: impl serde::Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| Error::Serialize(e).to_json_rpc())
}
