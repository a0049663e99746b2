//! HTTP client for the evaluation backend.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::BackendResponse;
use crate::{
    ConversationMessage, Endpoints, Error, EvaluationRequest, EvaluationResult, ModelSize, Result,
    ToolDefinition,
};

/// Default bound on a single backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Builder for creating an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct EvaluatorBuilder {
    endpoints: Endpoints,
    timeout: Duration,
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EvaluatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every endpoint.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replace the endpoint for one model size.
    pub fn endpoint(mut self, size: ModelSize, url: impl Into<String>) -> Self {
        self.endpoints = self.endpoints.with(size, url);
        self
    }

    /// Set the timeout for each backend call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the evaluator.
    pub fn build(self) -> Result<Evaluator> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("toolcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Evaluator {
            client,
            endpoints: self.endpoints,
            timeout: self.timeout,
        })
    }
}

/// Forwards evaluation requests to the backend.
///
/// Holds one HTTP client for its whole life; clones share the connection pool.
#[derive(Clone)]
pub struct Evaluator {
    client: reqwest::Client,
    endpoints: Endpoints,
    timeout: Duration,
}

impl Evaluator {
    /// Create a builder for the evaluator.
    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::new()
    }

    /// URL that handles `size`.
    pub fn endpoint(&self, size: ModelSize) -> &str {
        self.endpoints.url(size)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate the selector, then evaluate.
    pub async fn evaluate_tool_call(
        &self,
        available_tools: Vec<ToolDefinition>,
        message_history: Vec<ConversationMessage>,
        model_size: Option<&str>,
    ) -> Result<EvaluationResult> {
        let request = EvaluationRequest::new(available_tools, message_history, model_size)
            .inspect_err(|e| warn!(error = %e, "rejected evaluation request"))?;
        self.evaluate(&request).await
    }

    /// Send one request to the backend for the request's model size.
    #[tracing::instrument(
        name = "evaluate",
        skip_all,
        fields(evaluation_id = %Uuid::new_v4(), model_size = %request.model_size())
    )]
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult> {
        let endpoint = self.endpoint(request.model_size());
        debug!(
            endpoint,
            tools = request.available_tools().len(),
            messages = request.message_history().len(),
            "dispatching evaluation"
        );

        let response = self
            .client
            .post(endpoint)
            .json(&request.wire_body())
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "evaluation request failed"))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "backend rejected evaluation");
            return Err(Error::Backend {
                status: status.as_u16(),
            });
        }

        let body: BackendResponse = response
            .json()
            .await
            .inspect_err(|e| warn!(error = %e, "unreadable backend response"))?;

        let result = body
            .into_result()
            .inspect_err(|e| warn!(error = %e, "incomplete backend response"))?;

        info!(
            score = %result.score,
            reasons = result.reason.len(),
            "evaluation complete"
        );
        Ok(result)
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "evaluator(default={}, timeout={:?})",
            self.endpoint(ModelSize::default()),
            self.timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let evaluator = Evaluator::builder().build().unwrap();
        assert_eq!(evaluator.timeout(), DEFAULT_TIMEOUT);
        for size in ModelSize::ALL {
            assert_eq!(evaluator.endpoint(size), Endpoints::default().url(size));
        }
    }

    #[test]
    fn builder_overrides() {
        let evaluator = Evaluator::builder()
            .endpoint(ModelSize::Medium, "http://127.0.0.1:9/3b")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(evaluator.endpoint(ModelSize::Medium), "http://127.0.0.1:9/3b");
        assert_eq!(evaluator.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn display_shows_default_endpoint() {
        let evaluator = Evaluator::builder()
            .endpoint(ModelSize::Small, "http://backend/small")
            .build()
            .unwrap();
        assert!(evaluator.to_string().contains("http://backend/small"));
    }
}
