//! Configuration file parsing for the server.
//!
//! Loads bind settings, the CORS allow-list, rate limits, provider and
//! analyzer settings from TOML. Every field has a default, so an empty file
//! is a valid configuration. The API credential is never read from here; it
//! comes from the `OPENAI_API_KEY` environment variable.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use truthlens_analyzer::AnalyzerConfig;
use truthlens_llm::openai::{DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};

/// Upper bound for `provider.max_retries`
pub const MAX_PROVIDER_RETRIES: u32 = 10;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A CORS origin is not a valid header value
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,

    /// Per-client request allowance
    pub rate_limit: RateLimitConfig,

    /// Completion API connection settings
    pub provider: ProviderConfig,

    /// Model, temperature, timeout and input cap
    pub analyzer: AnalyzerConfig,
}

/// Fixed-window rate limit settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window and client address
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

/// Completion API connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API root, without `/chat/completions`
    pub base_url: String,

    /// Retries after the first attempt, for transient upstream failures only
    pub max_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 8000,
            cors_origins: default_cors_origins(),
            rate_limit: RateLimitConfig::default(),
            provider: ProviderConfig::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Frontend origins allowed by default
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "https://zippy-cobbler-58bcb8.netlify.app".to_string(),
    ]
}

impl RateLimitConfig {
    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_secs must be greater than 0".to_string(),
            ));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url must not be empty".to_string()));
        }
        if self.provider.max_retries > MAX_PROVIDER_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be at most {}",
                MAX_PROVIDER_RETRIES
            )));
        }
        self.analyzer
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("analyzer: {}", e)))
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
