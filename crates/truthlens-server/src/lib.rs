//! TruthLens Server
//!
//! HTTP front end for the analyzer: one analyze endpoint behind a per-client
//! rate limit and a CORS allow-list.

#![warn(missing_docs)]

pub mod config;
pub mod cors;
pub mod handlers;
pub mod rate_limit;

use axum::Router;
use config::{ConfigError, ServerConfig};
use handlers::{create_router, AppState};
use rate_limit::FixedWindowLimiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use truthlens_analyzer::Analyzer;
use truthlens_llm::{LlmError, OpenAiProvider};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider could not be constructed
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Wire routes, state and CORS into one application
pub fn build_app(state: AppState, cors_origins: &[String]) -> Result<Router, ConfigError> {
    Ok(create_router(state).layer(cors::cors_layer(cors_origins)?))
}

/// Start the HTTP server
///
/// Builds the OpenAI provider from the environment, the analyzer and the
/// rate limiter, then serves until Ctrl-C. A missing API key does not stop
/// startup: every analyze call reports it as a configuration error instead.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting TruthLens server");
    info!("Bind address: {}", config.bind_addr());
    info!(
        "Model: {} (temperature {})",
        config.analyzer.model, config.analyzer.temperature
    );
    info!(
        "Rate limit: {} requests per {} seconds",
        config.rate_limit.max_requests, config.rate_limit.window_secs
    );
    info!("CORS origins: {:?}", config.cors_origins);

    let provider = OpenAiProvider::from_env(&config.provider.base_url, config.analyzer.timeout())?
        .with_max_retries(config.provider.max_retries);

    if !provider.has_credential() {
        warn!(
            "{} is not set; analyze requests will fail with a configuration error",
            truthlens_llm::openai::API_KEY_ENV
        );
    }

    let state = AppState {
        analyzer: Analyzer::new(provider, config.analyzer.clone()),
        limiter: Arc::new(FixedWindowLimiter::from_config(&config.rate_limit)),
    };

    let app = build_app(state, &config.cors_origins)?;

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
