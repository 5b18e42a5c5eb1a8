//! TruthLens Completion Provider Layer
//!
//! The seam between the analyzer and a third-party text-completion API.
//!
//! # Architecture
//!
//! The analyzer only sees [`CompletionProvider`]: it hands over a model
//! identifier, role-tagged messages and a temperature, and gets one text
//! completion back or an [`LlmError`].
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions over HTTP
//!
//! # Examples
//!
//! ```
//! use truthlens_llm::{ChatMessage, CompletionProvider, CompletionRequest, MockProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")], 0.1);
//! let result = provider.complete(&request).await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during completion calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// No credential available; no request was sent
    #[error("API key not configured: {0}")]
    MissingCredential(String),

    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status}: {detail}")]
    Api {
        /// HTTP status code returned by the upstream
        status: u16,
        /// Response body as returned, usually a JSON error object
        detail: String,
    },

    /// Upstream answered 2xx but the body held no usable completion
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Structured payload the upstream sent back, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            LlmError::Api { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly succeed
    ///
    /// Transport failures, throttling (429) and server-side (5xx) errors are
    /// transient. Auth and request errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Communication(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standing instructions for the model
    System,
    /// The end-user turn
    User,
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Everything a provider needs for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "gpt-4o")
    pub model: String,
    /// Ordered conversation
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a completion request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
        }
    }
}

/// A text-completion backend
///
/// Implementations perform at most one logical call per invocation and
/// return the completion text untouched.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Mock completion provider for deterministic testing
///
/// Returns scripted outcomes without making any network calls. Queued
/// outcomes are consumed first, in order; after that the default response is
/// returned. Clones share the queue and the call log.
///
/// # Examples
///
/// ```
/// use truthlens_llm::{CompletionProvider, CompletionRequest, LlmError, MockProvider};
///
/// # async fn example() {
/// let provider = MockProvider::new("Fixed response");
/// provider.push_error(LlmError::Communication("down".to_string()));
///
/// let request = CompletionRequest::new("m", vec![], 0.0);
/// assert!(provider.complete(&request).await.is_err());
/// assert_eq!(provider.complete(&request).await.unwrap(), "Fixed response");
/// assert_eq!(provider.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    sticky_error: Option<LlmError>,
    queued: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            sticky_error: None,
            queued: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a provider whose every call fails with `error`
    pub fn failing(error: LlmError) -> Self {
        Self {
            sticky_error: Some(error),
            ..Self::default()
        }
    }

    /// Queue a successful completion
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queued).push_back(Ok(response.into()));
    }

    /// Queue a failed completion
    pub fn push_error(&self, error: LlmError) {
        lock(&self.queued).push_back(Err(error));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Reset the call log
    pub fn reset_call_count(&self) {
        lock(&self.requests).clear();
    }

    /// The most recent request received, if any
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.requests).last().cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        lock(&self.requests).push(request.clone());

        if let Some(error) = &self.sticky_error {
            return Err(error.clone());
        }

        match lock(&self.queued).pop_front() {
            Some(outcome) => outcome,
            None => Ok(self.default_response.clone()),
        }
    }
}
