//! Evaluation request and result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, ModelSize, Result};

/// A tool the agent had access to (name, description, input schema).
///
/// Forwarded verbatim; the proxy does not look inside.
pub type ToolDefinition = Map<String, Value>;

/// One message of the conversation (role, content, optional `tool_calls`).
///
/// Forwarded verbatim and in order.
pub type ConversationMessage = Map<String, Value>;

/// Everything needed to evaluate one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    available_tools: Vec<ToolDefinition>,
    message_history: Vec<ConversationMessage>,
    model_size: ModelSize,
}

impl EvaluationRequest {
    /// Build a request, validating the optional model size selector.
    ///
    /// `None` selects [`ModelSize::default`].
    pub fn new(
        available_tools: Vec<ToolDefinition>,
        message_history: Vec<ConversationMessage>,
        model_size: Option<&str>,
    ) -> Result<Self> {
        let model_size = model_size
            .map(str::parse::<ModelSize>)
            .transpose()?
            .unwrap_or_default();
        Ok(Self::with_model_size(
            available_tools,
            message_history,
            model_size,
        ))
    }

    pub fn with_model_size(
        available_tools: Vec<ToolDefinition>,
        message_history: Vec<ConversationMessage>,
        model_size: ModelSize,
    ) -> Self {
        Self {
            available_tools,
            message_history,
            model_size,
        }
    }

    pub fn available_tools(&self) -> &[ToolDefinition] {
        &self.available_tools
    }

    pub fn message_history(&self) -> &[ConversationMessage] {
        &self.message_history
    }

    pub fn model_size(&self) -> ModelSize {
        self.model_size
    }

    pub(crate) fn wire_body(&self) -> BackendRequest<'_> {
        BackendRequest {
            messages: &self.message_history,
            available_tools: &self.available_tools,
        }
    }
}

/// Body POSTed to the backend. The history travels as `messages`.
#[derive(Debug, Serialize)]
pub(crate) struct BackendRequest<'a> {
    messages: &'a [ConversationMessage],
    available_tools: &'a [ToolDefinition],
}

/// Success body returned by the backend.
#[derive(Debug, Deserialize)]
pub(crate) struct BackendResponse {
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    reasoning: Option<Vec<String>>,
}

impl BackendResponse {
    pub(crate) fn into_result(self) -> Result<EvaluationResult> {
        let score = self.score.ok_or(Error::Contract("score"))?;
        Ok(EvaluationResult {
            score,
            reason: self.reasoning.unwrap_or_default(),
        })
    }
}

/// Verdict on how the agent used its tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Verdict as reported by the backend; see [`Score`] for known values.
    pub score: String,
    /// Explanations, possibly empty.
    pub reason: Vec<String>,
}

impl EvaluationResult {
    /// The verdict, if the backend returned one of the known scores.
    pub fn verdict(&self) -> Option<Score> {
        Score::parse(&self.score)
    }
}

/// Known verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Correct,
    IncorrectTool,
    IncorrectParameterNames,
    IncorrectParameterValues,
}

impl Score {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correct" => Some(Score::Correct),
            "incorrect_tool" => Some(Score::IncorrectTool),
            "incorrect_parameter_names" => Some(Score::IncorrectParameterNames),
            "incorrect_parameter_values" => Some(Score::IncorrectParameterValues),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Score::Correct => "correct",
            Score::IncorrectTool => "incorrect_tool",
            Score::IncorrectParameterNames => "incorrect_parameter_names",
            Score::IncorrectParameterValues => "incorrect_parameter_values",
        }
    }

    pub fn is_correct(self) -> bool {
        self == Score::Correct
    }
}
