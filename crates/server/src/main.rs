//! MergeSense server entry point.
//!
//! Loads configuration, initializes tracing, serves the web API, and shuts
//! down gracefully on SIGINT/SIGTERM.

mod signals;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mergesense_core::config::AppConfig;
use mergesense_web::WebServer;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// MergeSense HTTP API server.
#[derive(Parser, Debug)]
#[command(
    name = "mergesense-server",
    version,
    about = "HTTP API for AI-assisted merge conflict resolution"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Override the log level from the config file (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the listen address from the config file.
    #[arg(long)]
    listen: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load and resolve configuration
    let mut config =
        AppConfig::load_from_file(&args.config).context("failed to load configuration file")?;
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables in config")?;
    if let Some(ref listen) = args.listen {
        config.web.listen = listen.clone();
    }
    config
        .validate()
        .context("configuration validation failed")?;

    // Initialize tracing
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    // Startup banner
    info!("========================================");
    info!("  MergeSense Server v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    info!("Config file    : {}", args.config.display());
    info!("Webhook URL    : {}", config.webhook.url);
    info!(
        "API key        : {}",
        if config.webhook.api_key.is_some() { "configured" } else { "none" }
    );
    info!("Timeout        : {}ms", config.webhook.timeout_ms);
    info!("High confidence: {}", config.resolver.high_confidence_threshold);
    info!("Web listen     : {}", config.web.listen);
    info!("Log level      : {}", log_level);
    info!("========================================");

    let listen_addr = config.web.listen.clone();
    let web_server = WebServer::new(config).context("failed to initialize web server")?;

    web_server
        .start(&listen_addr, signals::wait_for_shutdown())
        .await
        .context("web server error")?;

    info!("MergeSense server stopped.");
    Ok(())
}
