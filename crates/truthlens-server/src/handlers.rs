//! HTTP request handlers for the analysis API.
//!
//! Implements the analyze endpoint, the welcome document and a health check
//! using axum. Rate limiting runs as middleware in front of analyze only.

use crate::rate_limit::{RateDecision, RateLimitPolicy};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, warn, Instrument};
use truthlens_analyzer::{AnalysisError, Analyzer};
use truthlens_domain::{AnalysisResult, ErrorCategory, RequestError, RequestId};

/// Response header carrying the per-call correlation id
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Runs the analysis pipeline
    pub analyzer: Analyzer,
    /// Decides whether a client may call analyze
    pub limiter: Arc<dyn RateLimitPolicy>,
}

/// Analyze request body
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequestBody {
    /// Article text
    pub input_text: String,
}

/// Analyze response body
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Score in [0, 100]
    pub factual_accuracy: u8,
    /// One of left, right, neutral
    pub bias: String,
    /// One of neutral, alarmist, euphoric
    pub emotional_tone: String,
    /// Advice for the reader
    pub recommendation: String,
}

impl From<&AnalysisResult> for AnalysisResponse {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            factual_accuracy: result.factual_accuracy(),
            bias: result.bias().to_string(),
            emotional_tone: result.emotional_tone().to_string(),
            recommendation: result.recommendation().to_string(),
        }
    }
}

/// Welcome document served at the root
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    /// Greeting
    pub message: String,
    /// Available endpoints
    pub endpoints: Endpoints,
}

/// Endpoint directory in the welcome document
#[derive(Debug, Serialize, Deserialize)]
pub struct Endpoints {
    /// Path of the analyze endpoint
    pub analyze: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Server version
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Failure category, e.g. "upstream-failure"
    pub category: String,
    /// Human-readable message
    pub detail: String,
    /// Completion exactly as received, on response-contract failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Completion after fence stripping, on response-contract failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
}

impl ErrorResponse {
    fn new(category: &str, detail: String) -> Self {
        Self {
            category: category.to_string(),
            detail,
            raw: None,
            normalized: None,
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// The analysis pipeline failed
    Analysis(AnalysisError),
    /// The request body broke an input rule
    InvalidRequest(RequestError),
    /// The request body is not the expected JSON
    InvalidBody(JsonRejection),
    /// The client exceeded its allowance
    RateLimited {
        /// Time until the client's window resets
        retry_after: Duration,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Analysis(e) => {
                let mut body = ErrorResponse::new(e.category().as_str(), e.to_string());
                if let AnalysisError::ContractFailure {
                    raw, normalized, ..
                } = e
                {
                    body.raw = Some(raw);
                    body.normalized = Some(normalized);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::InvalidRequest(e) => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, INVALID_REQUEST, e.to_string())
            }
            AppError::InvalidBody(rejection) => {
                error_response(rejection.status(), INVALID_REQUEST, rejection.body_text())
            }
            AppError::RateLimited { retry_after } => {
                // Round up so clients never retry a moment too early
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let secs = secs.max(1);
                let mut response = error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorCategory::RateLimit.as_str(),
                    format!("Rate limit exceeded. Try again in {} seconds.", secs),
                );
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, header::HeaderValue::from(secs));
                response
            }
        }
    }
}

/// Category for bodies rejected before analysis
const INVALID_REQUEST: &str = "invalid-request";

fn error_response(status: StatusCode, category: &str, detail: String) -> Response {
    (status, Json(ErrorResponse::new(category, detail))).into_response()
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        AppError::Analysis(e)
    }
}

impl From<RequestError> for AppError {
    fn from(e: RequestError) -> Self {
        AppError::InvalidRequest(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection)
    }
}

/// POST /api/analyze - Analyze an article
async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequestBody>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Json(body) = body?;
    let request = state.analyzer.request(body.input_text)?;
    let result = state.analyzer.analyze(&request).await?;

    Ok(Json(AnalysisResponse::from(&result)))
}

/// Give every analyze call a request id: a tracing span around the whole
/// call, rate limiting included, and a response header on every outcome
async fn tag_request(request: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    let span = info_span!("analyze", request_id = %request_id);

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// GET / - Welcome document
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to TruthLens API".to_string(),
        endpoints: Endpoints {
            analyze: "/api/analyze".to_string(),
        },
    })
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Reject over-limit clients before the handler runs
async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_ip(&request);

    match state.limiter.check(client) {
        RateDecision::Allow { .. } => Ok(next.run(request).await),
        RateDecision::Reject { retry_after } => {
            warn!("Rate limit exceeded for {}", client);
            Err(AppError::RateLimited { retry_after })
        }
    }
}

/// Peer address of the connection; unspecified when not served over TCP
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let analysis_routes = AxumRouter::new()
        .route("/analyze", post(analyze))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .route_layer(middleware::from_fn(tag_request));

    AxumRouter::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", analysis_routes)
        .with_state(state)
}
