//! Backend model variants and their endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const SMALL_URL: &str = "https://quotient-ai--tool-call-evaluator-0-5b-api-v0-fastapi-app.modal.run/api/v1/detections/tool-use";
const MEDIUM_URL: &str = "https://quotient-ai--tool-call-evaluator-3b-api-v0-fastapi-app.modal.run/api/v1/detections/tool-use";
const LARGE_URL: &str = "https://quotient-ai--tool-call-evaluator-7b-api-v0-fastapi-app.modal.run/api/v1/detections/tool-use";

/// Size of the evaluator model that scores a request.
///
/// Larger models are slower and more accurate. Defaults to the smallest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSize {
    #[default]
    #[serde(rename = "0.5B")]
    Small,
    #[serde(rename = "3B")]
    Medium,
    #[serde(rename = "7B")]
    Large,
}

impl ModelSize {
    /// Every recognized size, smallest first.
    pub const ALL: [ModelSize; 3] = [ModelSize::Small, ModelSize::Medium, ModelSize::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelSize::Small => "0.5B",
            ModelSize::Medium => "3B",
            ModelSize::Large => "7B",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| {
                let expected = ModelSize::ALL.map(ModelSize::as_str).join(", ");
                Error::Validation(format!(
                    "unrecognized model_size '{s}' (expected one of: {expected})"
                ))
            })
    }
}

/// One backend URL per [`ModelSize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    small: String,
    medium: String,
    large: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            small: SMALL_URL.to_string(),
            medium: MEDIUM_URL.to_string(),
            large: LARGE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// URL that evaluates requests for `size`.
    pub fn url(&self, size: ModelSize) -> &str {
        match size {
            ModelSize::Small => &self.small,
            ModelSize::Medium => &self.medium,
            ModelSize::Large => &self.large,
        }
    }

    /// Replace the URL for `size`.
    pub fn with(mut self, size: ModelSize, url: impl Into<String>) -> Self {
        let slot = match size {
            ModelSize::Small => &mut self.small,
            ModelSize::Medium => &mut self.medium,
            ModelSize::Large => &mut self.large,
        };
        *slot = url.into();
        self
    }
}
