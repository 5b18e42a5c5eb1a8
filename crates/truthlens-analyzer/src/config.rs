//! Configuration for the Analyzer

use serde::{Deserialize, Serialize};
use std::time::Duration;
use truthlens_domain::MAX_INPUT_CHARS;

/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default sampling temperature
///
/// Kept low: the validator has no tolerance for creative formatting.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Configuration for the Analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Model identifier sent with every completion
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum time for a single completion call (seconds)
    pub timeout_secs: u64,

    /// Maximum article length (characters)
    pub max_input_chars: usize,
}

impl AnalyzerConfig {
    /// Get the completion timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_input_chars == 0 {
            return Err("max_input_chars must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: 60,
            max_input_chars: MAX_INPUT_CHARS,
        }
    }
}
