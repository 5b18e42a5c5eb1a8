//! TruthLens Server CLI
//!
//! Starts the HTTP server for article analysis.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use truthlens_server::{config::ServerConfig, start_server};

/// TruthLens - bias and accuracy analysis API
#[derive(Debug, Parser)]
#[command(name = "truthlens-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "TRUTHLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(short, long, env = "TRUTHLENS_BIND")]
    bind: Option<String>,

    /// Bind port, overrides the config file
    #[arg(short, long, env = "TRUTHLENS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // .env is optional; OPENAI_API_KEY may come from the real environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };

    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    start_server(config).await.context("server failed")?;

    Ok(())
}
