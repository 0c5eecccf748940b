//! MergeSense web server and REST API.
//!
//! Provides an Axum-based HTTP server with:
//! - Status and health endpoints
//! - A proxy to the AI merge workflow that returns normalized results
//! - Normalization of raw workflow payloads
//! - Conflict-marker extraction

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use mergesense_core::config::AppConfig;
use mergesense_core::response::ResponseNormalizer;
use mergesense_core::webhook::WebhookClient;

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub client: WebhookClient,
    pub normalizer: ResponseNormalizer,
}

impl AppState {
    /// Build state from a resolved configuration.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let client = WebhookClient::new(&config.webhook)?;
        let normalizer = config.normalizer();
        Ok(Self { client, normalizer })
    }
}

/// The web server.
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server from a resolved configuration.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(AppState::from_config(config)?),
        })
    }

    /// Build the application router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        Router::new()
            .merge(api::status::routes())
            .merge(api::resolve::routes())
            .merge(api::normalize::routes())
            .merge(api::conflicts::routes())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors)
                    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
            )
            .with_state(Arc::clone(&self.state))
    }

    /// Start the web server, listening on the given address until the
    /// `shutdown` future completes.
    pub async fn start<F>(self, listen_addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listen_addr.parse()?;
        let app = self.router();

        info!(addr = %addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("web server stopped");
        Ok(())
    }
}
