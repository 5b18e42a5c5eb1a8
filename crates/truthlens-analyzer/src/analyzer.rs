//! Core Analyzer implementation

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::normalize::normalize_response;
use crate::prompt::PromptBuilder;
use crate::schema::validate_analysis;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use truthlens_domain::{AnalysisRequest, AnalysisResult, RequestError};
use truthlens_llm::{CompletionProvider, CompletionRequest};

/// The Analyzer turns article text into a validated assessment
///
/// One call is: build prompt, one completion round-trip, normalize,
/// validate. No state is shared between calls apart from the provider.
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn CompletionProvider>,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create a new Analyzer
    pub fn new(provider: impl CompletionProvider + 'static, config: AnalyzerConfig) -> Self {
        Self::with_shared_provider(Arc::new(provider), config)
    }

    /// Create an Analyzer around an already shared provider
    pub fn with_shared_provider(
        provider: Arc<dyn CompletionProvider>,
        config: AnalyzerConfig,
    ) -> Self {
        Self { provider, config }
    }

    /// The configuration in force
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Build a request under this analyzer's length cap
    pub fn request(&self, input_text: impl Into<String>) -> Result<AnalysisRequest, RequestError> {
        AnalysisRequest::with_max_chars(input_text, self.config.max_input_chars)
    }

    /// Analyze one article
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Configuration`] when the provider has no credential
    /// - [`AnalysisError::Upstream`] when the completion call fails or times out
    /// - [`AnalysisError::ContractFailure`] when the completion breaks the schema
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        info!(
            "Starting analysis, text length {} chars",
            request.input_text().chars().count()
        );

        // Invoke
        let raw = self.invoke(request).await?;
        debug!("Raw completion: {}", raw);

        // Normalize + validate
        let normalized = normalize_response(&raw);
        debug!("Cleaned content: {}", normalized);

        match validate_analysis(normalized) {
            Ok(result) => {
                info!(
                    "Analysis complete: factual_accuracy={}, bias={}, emotional_tone={}",
                    result.factual_accuracy(),
                    result.bias(),
                    result.emotional_tone()
                );
                Ok(result)
            }
            Err(reason) => {
                warn!("Completion failed validation: {}", reason);
                Err(AnalysisError::ContractFailure {
                    reason,
                    normalized: normalized.to_string(),
                    raw,
                })
            }
        }
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let messages = PromptBuilder::new(request.input_text()).messages();
        let completion =
            CompletionRequest::new(&self.config.model, messages, self.config.temperature);

        debug!("Prompt length: {} chars", completion.messages[1].content.len());

        let outcome = timeout(self.config.timeout(), self.provider.complete(&completion))
            .await
            .map_err(|_| AnalysisError::Upstream {
                message: format!(
                    "completion timed out after {} seconds",
                    self.config.timeout_secs
                ),
                detail: None,
            })?;

        outcome.map_err(|e| {
            warn!("Completion call failed: {}", e);
            AnalysisError::from(e)
        })
    }
}
