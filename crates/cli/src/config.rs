//! Configuration loading from hydra.toml.

use runtime::ToolPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion endpoint settings.
    pub gateway: GatewayConfig,

    /// When tool schemas are sent to the model.
    pub tool_policy: ToolPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            tool_policy: ToolPolicy::default(),
        }
    }
}

/// Completion endpoint configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Endpoint base URL, e.g. "https://api.openai.com/v1".
    /// Falls back to the BASE_URL environment variable.
    pub base_url: Option<String>,

    /// Bearer token for the endpoint.
    /// Falls back to the API_KEY environment variable.
    pub api_key: Option<String>,

    /// Model to request.
    pub model: String,

    /// Completion token budget per request.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Bound on each request's wait, in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve credentials, preferring the config file over the
    /// environment (BASE_URL / API_KEY).
    pub fn credentials(&self) -> Result<(String, String), ConfigError> {
        let base_url = self
            .gateway
            .base_url
            .clone()
            .or_else(|| std::env::var("BASE_URL").ok())
            .ok_or(ConfigError::MissingBaseUrl)?;
        let api_key = self
            .gateway
            .api_key
            .clone()
            .or_else(|| std::env::var("API_KEY").ok())
            .ok_or(ConfigError::MissingApiKey)?;
        Ok((base_url, api_key))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("endpoint not configured: set gateway.base_url or the BASE_URL environment variable")]
    MissingBaseUrl,

    #[error("credentials not configured: set gateway.api_key or the API_KEY environment variable")]
    MissingApiKey,
}
