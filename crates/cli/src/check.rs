//! `toolcheck check`: call evaluate_tool_call on a running server.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use evaluator::{EvaluationResult, TOOL_NAME};
use mcp::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default server URL, matching `toolcheck serve` on this machine.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8888/mcp/";

const SESSION_HEADER: &str = "mcp-session-id";

/// Minimal MCP client over streamable HTTP.
pub struct HttpClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicI64,
    session_id: Option<String>,
}

impl HttpClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicI64::new(1),
            session_id: None,
        }
    }

    /// Perform the initialize handshake.
    pub async fn initialize(&mut self) -> Result<InitializeResult> {
        let params = InitializeParams::client("toolcheck-check", env!("CARGO_PKG_VERSION"));
        let request = JsonRpcRequest::new(self.next_request_id(), "initialize").with_params(params);
        let response = self.post(&request).await?;

        if let Some(session) = response.headers().get(SESSION_HEADER) {
            self.session_id = session.to_str().ok().map(str::to_string);
        }

        let result: InitializeResult = self.decode(request.id, response).await?;
        info!(
            server = %result.server_info.name,
            protocol = %result.protocol_version,
            "connected"
        );

        let notification = JsonRpcRequest::notification("notifications/initialized");
        self.post(&notification).await?;
        Ok(result)
    }

    /// Call a tool by name.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        let request = JsonRpcRequest::new(self.next_request_id(), "tools/call").with_params(params);
        let response = self.post(&request).await?;
        self.decode(request.id, response).await
    }

    // --- Internal methods ---

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn post(&self, message: &JsonRpcRequest) -> Result<reqwest::Response> {
        debug!(method = %message.method, url = %self.url, "sending");
        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(message);
        if let Some(session) = &self.session_id {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::InvalidResponse(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }
        Ok(response)
    }

    async fn decode<R>(&self, id: Option<RequestId>, response: reqwest::Response) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));
        let body = response.text().await?;

        let response: JsonRpcResponse = if is_event_stream {
            parse_event_stream(&body)?
        } else {
            serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))?
        };

        // Verify response ID matches
        if response.id != id {
            return Err(Error::InvalidResponse(format!(
                "response ID mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        let value = response.into_result()?;
        serde_json::from_value(value).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// First JSON-RPC response carried in an SSE body.
fn parse_event_stream(body: &str) -> Result<JsonRpcResponse> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .find_map(|data| serde_json::from_str(data.trim()).ok())
        .ok_or_else(|| Error::InvalidResponse("no JSON-RPC message in event stream".to_string()))
}

/// Sample tools used when `--tools` is not given.
pub fn sample_tools() -> Value {
    json!([{
        "name": "search_web",
        "description": "Search the web for information",
        "inputSchema": {
            "type": "object",
            "properties": {"query": {"type": "string", "description": "Search query"}},
            "required": ["query"]
        }
    }])
}

/// Sample conversation used when `--messages` is not given.
pub fn sample_messages() -> Value {
    json!([
        {"role": "user", "content": "Can you search for Python tutorials?"},
        {
            "role": "assistant",
            "content": "I'll search for Python tutorials for you.",
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {
                    "name": "search_web",
                    "arguments": "{\"query\": \"Python tutorials\"}"
                }
            }]
        }
    ])
}

/// Read a JSON array from `path`.
pub fn load_array(path: &Path) -> Result<Value> {
    let input_error = |reason: String| Error::Input {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| input_error(e.to_string()))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| input_error(e.to_string()))?;
    if !value.is_array() {
        return Err(input_error("expected a JSON array".to_string()));
    }
    Ok(value)
}

/// Build the tool arguments from the loaded (or sample) inputs.
pub fn arguments(tools: Value, messages: Value, model_size: Option<&str>) -> Value {
    let mut arguments = json!({
        "available_tools": tools,
        "message_history": messages,
    });
    if let Some(size) = model_size {
        arguments["model_size"] = json!(size);
    }
    arguments
}

/// Connect to `url` and run one evaluation.
pub async fn run(url: &str, arguments: Value) -> Result<EvaluationResult> {
    let mut client = HttpClient::new(url);
    client.initialize().await?;

    let result = client.call_tool(TOOL_NAME, arguments).await?;
    if result.is_error {
        return Err(Error::ToolFailed(result.text()));
    }

    let text = result.text();
    let value = match result.structured_content {
        Some(value) => value,
        None => serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("unexpected tool output: {e}")))?,
    };
    serde_json::from_value(value).map_err(|e| Error::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_initialize(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("mcp-session-id", "session-1")
                    .set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "result": {
                            "protocolVersion": "2025-03-26",
                            "capabilities": {"tools": {}},
                            "serverInfo": {"name": "mock", "version": "1"}
                        }
                    })),
            )
            .mount(mock_server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "notifications/initialized"})))
            .respond_with(ResponseTemplate::new(202))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn run_returns_structured_result() {
        let mock_server = MockServer::start().await;
        mount_initialize(&mock_server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": {"name": "evaluate_tool_call", "arguments": {"model_size": "3B"}}
            })))
            .and(header("mcp-session-id", "session-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {
                    "content": [{"type": "text", "text": "{}"}],
                    "structuredContent": {"score": "correct", "reason": ["fine"]},
                    "isError": false
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let args = arguments(sample_tools(), sample_messages(), Some("3B"));
        let result = run(&format!("{}/mcp/", mock_server.uri()), args)
            .await
            .unwrap();
        assert_eq!(result.score, "correct");
        assert_eq!(result.reason, vec!["fine".to_string()]);
    }

    #[tokio::test]
    async fn run_reports_tool_errors() {
        let mock_server = MockServer::start().await;
        mount_initialize(&mock_server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {
                    "content": [{"type": "text", "text": "API request failed with status 500"}],
                    "isError": true
                }
            })))
            .mount(&mock_server)
            .await;

        let args = arguments(sample_tools(), sample_messages(), None);
        let err = run(&mock_server.uri(), args).await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn decodes_event_stream_responses() {
        let mock_server = MockServer::start().await;
        mount_initialize(&mock_server).await;

        let event = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {
                "content": [{"type": "text", "text": "{\"score\":\"incorrect_tool\",\"reason\":[]}"}],
                "isError": false
            }
        });
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    format!("event: message\ndata: {event}\n\n"),
                    "text/event-stream",
                ),
            )
            .mount(&mock_server)
            .await;

        let args = arguments(sample_tools(), sample_messages(), None);
        let result = run(&mock_server.uri(), args).await.unwrap();
        assert_eq!(result.score, "incorrect_tool");
        assert!(result.reason.is_empty());
    }

    #[test]
    fn arguments_include_model_size_only_when_given() {
        let args = arguments(json!([]), json!([]), None);
        assert!(args.get("model_size").is_none());
        let args = arguments(json!([]), json!([]), Some("7B"));
        assert_eq!(args["model_size"], "7B");
    }

    #[test]
    fn load_array_rejects_objects() {
        let path = std::env::temp_dir().join(format!("toolcheck-{}.json", std::process::id()));
        std::fs::write(&path, "{\"role\": \"user\"}").unwrap();
        let err = load_array(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn parse_event_stream_skips_non_data_lines() {
        let body = "event: message\nid: 1\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n";
        let resp = parse_event_stream(body).unwrap();
        assert_eq!(resp.id, Some(RequestId::Number(1)));
    }
}
