//! OpenAI Provider Implementation
//!
//! Talks to any OpenAI-compatible chat completions endpoint.
//!
//! # Features
//!
//! - Async HTTP communication via `reqwest`
//! - Credential checked before any network I/O
//! - Upstream error bodies preserved verbatim
//! - Optional retry with exponential backoff (off by default)
//!
//! # Examples
//!
//! ```no_run
//! use truthlens_llm::OpenAiProvider;
//! use std::time::Duration;
//!
//! let provider = OpenAiProvider::from_env("https://api.openai.com/v1", Duration::from_secs(60))
//!     .unwrap()
//!     .with_max_retries(2);
//!
//! // Calls are async; drive them from a tokio runtime.
//! ```

use crate::{ChatMessage, CompletionProvider, CompletionRequest, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// OpenAI-compatible chat completion provider
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `base_url`: API root, without the `/chat/completions` suffix
    /// - `api_key`: bearer credential; `None` or empty makes every call fail
    ///   with [`LlmError::MissingCredential`]
    /// - `timeout`: per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let base_url: String = base_url.into();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_secs(1),
        })
    }

    /// Create a provider that reads its key from `OPENAI_API_KEY`
    ///
    /// A missing variable is not an error here; it is reported on each call.
    pub fn from_env(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        Self::new(base_url, std::env::var(API_KEY_ENV).ok(), timeout)
    }

    /// Set the maximum number of retries after the first attempt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay between retries; it doubles on every attempt
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Whether a credential is configured
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn attempt(&self, api_key: &str, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::InvalidResponse("completion contained no message content".to_string())
            })
    }
}

/// Exponential backoff: base, 2x base, 4x base, ... saturating at `Duration::MAX`
fn backoff_delay(base: Duration, attempts: u32) -> Duration {
    let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LlmError::MissingCredential(format!("Please set {} in the environment", API_KEY_ENV))
        })?;

        let mut attempts = 0;
        loop {
            match self.attempt(api_key, request).await {
                Ok(content) => {
                    debug!("Completion received ({} chars)", content.len());
                    return Ok(content);
                }
                Err(e) if e.is_transient() && attempts < self.max_retries => {
                    let delay = backoff_delay(self.retry_backoff, attempts);
                    attempts += 1;
                    warn!(
                        "Completion attempt {} failed: {}; retrying in {:?}",
                        attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "gpt-4o",
            vec![ChatMessage::system("json only"), ChatMessage::user("Article: hi")],
            0.1,
        )
    }

    /// Serve `app` on an ephemeral local port and return its base URL
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));

        // Large attempt counts must not overflow
        assert_eq!(backoff_delay(base, 40), base.saturating_mul(u32::MAX));
        assert_eq!(backoff_delay(Duration::MAX, 5), Duration::MAX);
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new(
            "https://api.example.com/v1/",
            Some("sk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.base_url, "https://api.example.com/v1");
        assert_eq!(provider.completions_url(), "https://api.example.com/v1/chat/completions");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
        assert!(provider.has_credential());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let provider =
            OpenAiProvider::new(DEFAULT_BASE_URL, Some("  ".to_string()), Duration::from_secs(5))
                .unwrap();
        assert!(!provider.has_credential());
    }

    #[test]
    fn test_with_max_retries() {
        let provider = OpenAiProvider::new(DEFAULT_BASE_URL, None, Duration::from_secs(5))
            .unwrap()
            .with_max_retries(3);
        assert_eq!(provider.max_retries, 3);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        // Unroutable endpoint: reaching it would yield a Communication error
        let provider =
            OpenAiProvider::new("http://localhost:99999", None, Duration::from_secs(5)).unwrap();

        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[tokio::test]
    async fn test_communication_error() {
        let provider = OpenAiProvider::new(
            "http://localhost:99999",
            Some("sk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        match provider.complete(&request()).await {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_completion_round_trip() {
        async fn handler(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer sk-test");
            let well_formed = body["model"] == "gpt-4o"
                && body["messages"][0]["role"] == "system"
                && body["messages"][1]["role"] == "user"
                && body["messages"][1]["content"] == "Article: hi"
                && (body["temperature"].as_f64().unwrap_or(1.0) - 0.1).abs() < 1e-6;

            if !(authorized && well_formed) {
                return (StatusCode::BAD_REQUEST, Json(json!({"error": "unexpected request"})));
            }

            (
                StatusCode::OK,
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
                })),
            )
        }

        let base = serve(Router::new().route("/v1/chat/completions", post(handler))).await;
        let provider =
            OpenAiProvider::new(base, Some("sk-test".to_string()), Duration::from_secs(5)).unwrap();

        let content = provider.complete(&request()).await.unwrap();
        assert_eq!(content, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_api_error_body_is_preserved() {
        async fn handler() -> (StatusCode, Json<Value>) {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}})),
            )
        }

        let base = serve(Router::new().route("/v1/chat/completions", post(handler))).await;
        let provider =
            OpenAiProvider::new(base, Some("sk-bad".to_string()), Duration::from_secs(5)).unwrap();

        let err = provider.complete(&request()).await.unwrap_err();
        match &err {
            LlmError::Api { status, detail } => {
                assert_eq!(*status, 401);
                assert!(detail.contains("invalid_api_key"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert!(err.detail().unwrap().contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        async fn handler() -> Json<Value> {
            Json(json!({"choices": []}))
        }

        let base = serve(Router::new().route("/v1/chat/completions", post(handler))).await;
        let provider =
            OpenAiProvider::new(base, Some("sk-test".to_string()), Duration::from_secs(5)).unwrap();

        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        async fn handler(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::SERVICE_UNAVAILABLE
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/v1/chat/completions", post(handler))
            .with_state(hits.clone());
        let base = serve(app).await;
        let provider =
            OpenAiProvider::new(base, Some("sk-test".to_string()), Duration::from_secs(5)).unwrap();

        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_when_enabled() {
        async fn handler(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, Json<Value>) {
            if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "slow down"})))
            } else {
                (
                    StatusCode::OK,
                    Json(json!({"choices": [{"message": {"content": "second time lucky"}}]})),
                )
            }
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/v1/chat/completions", post(handler))
            .with_state(hits.clone());
        let base = serve(app).await;
        let provider = OpenAiProvider::new(base, Some("sk-test".to_string()), Duration::from_secs(5))
            .unwrap()
            .with_max_retries(2)
            .with_retry_backoff(Duration::from_millis(10));

        let content = provider.complete(&request()).await.unwrap();
        assert_eq!(content, "second time lucky");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        async fn handler(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::UNAUTHORIZED
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/v1/chat/completions", post(handler))
            .with_state(hits.clone());
        let base = serve(app).await;
        let provider = OpenAiProvider::new(base, Some("sk-test".to_string()), Duration::from_secs(5))
            .unwrap()
            .with_max_retries(3)
            .with_retry_backoff(Duration::from_millis(10));

        assert!(provider.complete(&request()).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
