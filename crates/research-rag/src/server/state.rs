//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::providers::ModelContext;
use crate::session::SessionManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Arc<RagConfig>,
    models: ModelContext,
    sessions: SessionManager,
}

impl AppState {
    /// Build model providers from `config` and create the state
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");
        let models = ModelContext::from_config(&config).await?;
        Ok(Self::with_models(config, models))
    }

    /// Create state around already-built providers
    pub fn with_models(config: RagConfig, models: ModelContext) -> Self {
        let config = Arc::new(config);
        let sessions = SessionManager::new(Arc::clone(&config), models.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                models,
                sessions,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn models(&self) -> &ModelContext {
        &self.inner.models
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }
}
