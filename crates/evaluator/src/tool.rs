//! The `evaluate_tool_call` MCP tool.

use mcp::{CallToolResult, Tool, ToolHandler};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ConversationMessage, Evaluator, ModelSize, ToolDefinition};

/// Name the tool is registered under.
pub const TOOL_NAME: &str = "evaluate_tool_call";

const DESCRIPTION: &str = r#"Double check agent tool calls. Evaluates whether an AI agent correctly used the tools available to it in a conversation.

Parameters:
- available_tools: tool definitions, each with name, description and input_schema
- message_history: conversation messages with role, content and optional tool_calls
- model_size: evaluator model, one of 0.5B (default), 3B, 7B

Example available_tools:
[
  {
    "name": "google-play-developer",
    "description": "Get apps by a developer on Google Play",
    "input_schema": {
      "type": "object",
      "properties": {
        "devId": {"type": "string", "description": "Developer ID"},
        "num": {"type": "number", "default": 60, "description": "Number of results"},
        "lang": {"type": "string", "default": "en", "description": "Language code"},
        "country": {"type": "string", "default": "us", "description": "Country code"}
      },
      "required": ["devId"]
    }
  }
]

Example message_history:
[
  {"role": "user", "content": "Get 50 apps by 'Example Developer' for US market in English"},
  {
    "role": "assistant",
    "content": "I'll fetch the apps for you.",
    "tool_calls": [{
      "function": {
        "name": "google-play-developer",
        "arguments": {"devId": "com.example.developer", "num": 50, "lang": "en", "country": "us"}
      }
    }]
  }
]

Returns:
{"score": "correct|incorrect_tool|incorrect_parameter_names|incorrect_parameter_values", "reason": ["explanation of any issues found"]}"#;

/// Arguments accepted by the tool.
#[derive(Debug, Deserialize)]
struct Arguments {
    available_tools: Vec<ToolDefinition>,
    message_history: Vec<ConversationMessage>,
    #[serde(default)]
    model_size: Option<String>,
}

/// Exposes an [`Evaluator`] as an MCP tool.
pub struct EvaluateToolCall {
    evaluator: Evaluator,
}

impl EvaluateToolCall {
    pub fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// The tool definition advertised by tools/list.
    pub fn definition() -> Tool {
        let sizes: Vec<&str> = ModelSize::ALL.iter().map(|s| s.as_str()).collect();
        Tool {
            name: TOOL_NAME.to_string(),
            description: Some(DESCRIPTION.to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "available_tools": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Tool definitions with name, description and input_schema"
                    },
                    "message_history": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Conversation messages with role, content and optional tool_calls"
                    },
                    "model_size": {
                        "type": "string",
                        "enum": sizes,
                        "default": ModelSize::default().as_str(),
                        "description": "Size of the evaluator model"
                    }
                },
                "required": ["available_tools", "message_history"]
            }),
            output_schema: Some(json!({
                "type": "object",
                "properties": {
                    "score": {"type": "string"},
                    "reason": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["score", "reason"]
            })),
        }
    }
}

impl ToolHandler for EvaluateToolCall {
    fn tools(&self) -> Vec<Tool> {
        vec![Self::definition()]
    }

    async fn call(&self, name: &str, arguments: Option<Value>) -> mcp::Result<CallToolResult> {
        if name != TOOL_NAME {
            return Err(mcp::Error::ToolNotFound(name.to_string()));
        }

        let arguments: Arguments =
            serde_json::from_value(arguments.unwrap_or_else(|| json!({})))
                .map_err(|e| mcp::Error::InvalidParams(e.to_string()))?;

        let result = self
            .evaluator
            .evaluate_tool_call(
                arguments.available_tools,
                arguments.message_history,
                arguments.model_size.as_deref(),
            )
            .await
            .map_err(|e| mcp::Error::ToolCallFailed(e.to_string()))?;

        Ok(CallToolResult::structured(serde_json::to_value(&result)?))
    }
}
