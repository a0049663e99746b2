//! Configuration loading from toolcheck.toml.

use std::path::Path;
use std::time::Duration;

use evaluator::{Endpoints, Evaluator, ModelSize};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "toolcheck.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Evaluation backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// HTTP transport configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Evaluation backend configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Timeout for one backend call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-model-size endpoint overrides.
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Endpoint overrides, keyed by model size name.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointsConfig {
    #[serde(rename = "0.5B")]
    pub small: Option<String>,
    #[serde(rename = "3B")]
    pub medium: Option<String>,
    #[serde(rename = "7B")]
    pub large: Option<String>,
}

/// HTTP transport configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    evaluator::DEFAULT_TIMEOUT.as_secs()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if given, else `toolcheck.toml` if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (size, url) in self.endpoint_overrides() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "backend.endpoints.\"{size}\" is not an http(s) URL: {url}"
                )));
            }
        }
        Ok(())
    }

    fn endpoint_overrides(&self) -> impl Iterator<Item = (ModelSize, &str)> {
        let endpoints = &self.backend.endpoints;
        [
            (ModelSize::Small, endpoints.small.as_deref()),
            (ModelSize::Medium, endpoints.medium.as_deref()),
            (ModelSize::Large, endpoints.large.as_deref()),
        ]
        .into_iter()
        .filter_map(|(size, url)| url.map(|url| (size, url)))
    }

    /// Default endpoints with this configuration's overrides applied.
    pub fn endpoints(&self) -> Endpoints {
        self.endpoint_overrides()
            .fold(Endpoints::default(), |endpoints, (size, url)| {
                endpoints.with(size, url)
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Build the evaluator described by this configuration.
    pub fn evaluator(&self) -> evaluator::Result<Evaluator> {
        Evaluator::builder()
            .endpoints(self.endpoints())
            .timeout(self.timeout())
            .build()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
