//! HTTP server for the research RAG system

pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::ModelContext;
use state::AppState;

/// Research RAG HTTP server
pub struct RagServer {
    state: AppState,
}

impl RagServer {
    /// Create a server, building model providers from `config`
    pub async fn new(config: RagConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config).await?,
        })
    }

    /// Create a server around already-built providers
    pub fn with_models(config: RagConfig, models: ModelContext) -> Self {
        Self {
            state: AppState::with_models(config, models),
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let config = self.state.config();
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();
        spawn_session_reaper(self.state.clone());

        tracing::info!("Starting research RAG server on http://{}", addr);
        tracing::info!("API info: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }
}

/// Assemble routes and middleware around `state`
pub fn build_router(state: AppState) -> Router {
    let max_upload_size = state.config().server.max_upload_size;
    let enable_cors = state.config().server.enable_cors;

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .nest("/api", routes::api_routes(max_upload_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint: both model backends must answer
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let models = state.models();
    let (embedder, llm) = tokio::join!(models.embedder.health_check(), models.llm.health_check());

    match (embedder, llm) {
        (Ok(true), Ok(true)) => StatusCode::OK,
        (embedder, llm) => {
            tracing::warn!(
                "Not ready: {} healthy={:?}, {} healthy={:?}",
                models.embedder.name(),
                embedder,
                models.llm.name(),
                llm
            );
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Periodically drop sessions idle for longer than `staging.session_ttl_secs`
fn spawn_session_reaper(state: AppState) {
    let ttl = Duration::from_secs(state.config().staging.session_ttl_secs);
    if ttl.is_zero() {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ttl.min(Duration::from_secs(60)));
        loop {
            ticker.tick().await;
            let evicted = state.sessions().evict_idle(ttl).await;
            if evicted > 0 {
                tracing::info!("Expired {} idle sessions", evicted);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
