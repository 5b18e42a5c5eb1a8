//! Error types for the Analyzer

use thiserror::Error;
use truthlens_domain::ErrorCategory;
use truthlens_llm::LlmError;

/// Why a normalized completion failed the analysis schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Not parseable as a single JSON object
    #[error("Invalid JSON response from API: {0}")]
    Malformed(String),

    /// One or more required keys absent
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A key is present but its value is mistyped or outside its domain
    #[error("{field} must be {expected}, got {found}")]
    OutOfDomain {
        /// Offending key
        field: &'static str,
        /// Human-readable description of the accepted values
        expected: String,
        /// The value as received, JSON-encoded
        found: String,
    },
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::Malformed(e.to_string())
    }
}

/// Classified failure of one analysis call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Required credential or setting missing; nothing was sent upstream
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The completion call failed
    #[error("OpenAI API error: {message}")]
    Upstream {
        /// Upstream error payload when one was returned, else a description
        message: String,
        /// Raw structured payload from the upstream, if any
        detail: Option<String>,
    },

    /// The completion arrived but broke the response contract
    #[error("Invalid response format: {reason}")]
    ContractFailure {
        /// The rule that failed
        reason: SchemaError,
        /// Completion exactly as received
        raw: String,
        /// Completion after fence stripping
        normalized: String,
    },
}

impl AnalysisError {
    /// Category carried on the error response
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::Configuration(_) => ErrorCategory::Configuration,
            AnalysisError::Upstream { .. } => ErrorCategory::Upstream,
            AnalysisError::ContractFailure { .. } => ErrorCategory::ResponseContract,
        }
    }
}

impl From<LlmError> for AnalysisError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingCredential(msg) => AnalysisError::Configuration(format!(
                "OpenAI API key not configured. {}",
                msg
            )),
            other => {
                let detail = other.detail().map(str::to_string);
                AnalysisError::Upstream {
                    message: detail.clone().unwrap_or_else(|| other.to_string()),
                    detail,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_configuration() {
        let err: AnalysisError = LlmError::MissingCredential("Please set OPENAI_API_KEY".into()).into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_upstream_payload_is_preserved() {
        let body = r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#;
        let err: AnalysisError = LlmError::Api {
            status: 429,
            detail: body.to_string(),
        }
        .into();

        assert_eq!(err.category(), ErrorCategory::Upstream);
        assert_eq!(err.to_string(), format!("OpenAI API error: {}", body));
        match err {
            AnalysisError::Upstream { detail, .. } => assert_eq!(detail.as_deref(), Some(body)),
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_without_payload() {
        let err: AnalysisError = LlmError::Communication("connection refused".into()).into();
        assert_eq!(
            err,
            AnalysisError::Upstream {
                message: "Communication error: connection refused".to_string(),
                detail: None,
            }
        );
    }

    #[test]
    fn test_contract_failure_message() {
        let err = AnalysisError::ContractFailure {
            reason: SchemaError::MissingFields(vec!["bias".into(), "recommendation".into()]),
            raw: "{}".into(),
            normalized: "{}".into(),
        };
        assert_eq!(err.category(), ErrorCategory::ResponseContract);
        assert_eq!(
            err.to_string(),
            "Invalid response format: Missing required fields: bias, recommendation"
        );
    }
}
