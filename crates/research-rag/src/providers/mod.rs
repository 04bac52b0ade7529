//! Provider abstractions for embeddings, chat completion and vector storage
//!
//! The pipeline only talks to these traits. [`ModelContext`] is built once at
//! startup from [`RagConfig`] and handed to every stage that needs a model.

pub mod embedding;
pub mod groq;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod vector_store;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use embedding::EmbeddingProvider;
pub use groq::GroqLlm;
pub use llm::{ChatMessage, ChatRequest, ChatRole, LlmProvider};
pub use memory::InMemoryVectorStore;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use vector_store::{VectorSearchResult, VectorStoreProvider};

use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingBackend, LlmBackend, RagConfig};
use crate::error::{Error, Result};

/// Longest wait between two retries of a provider request
const MAX_BACKOFF_SECS: u64 = 30;

/// Exponential backoff for retry `attempt` (0-based), capped at [`MAX_BACKOFF_SECS`]
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS))
}

/// Embedding model and LLM shared by indexing, querying and extraction
#[derive(Clone)]
pub struct ModelContext {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

impl ModelContext {
    /// Wrap already-built providers
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { embedder, llm }
    }

    /// Build providers from configuration.
    ///
    /// Fails with [`Error::MissingCredential`] before any network call when the
    /// Groq backend is selected and its key is not set.
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        let llm: Arc<dyn LlmProvider> = match config.llm.backend {
            LlmBackend::Groq => Arc::new(GroqLlm::new(&config.llm)?),
            LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
        };

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(&config.embeddings)?),
            EmbeddingBackend::Onnx => Self::onnx_embedder(config).await?,
        };

        tracing::info!(
            "Models ready: llm={} ({}), embeddings={} ({} dims)",
            llm.name(),
            llm.model(),
            embedder.name(),
            embedder.dimensions()
        );

        Ok(Self { embedder, llm })
    }

    #[cfg(feature = "onnx")]
    async fn onnx_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(onnx::OnnxEmbedder::new(&config.embeddings).await?))
    }

    #[cfg(not(feature = "onnx"))]
    async fn onnx_embedder(_config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        Err(Error::Config(
            "ONNX embeddings requested but research-rag was built without the `onnx` feature"
                .to_string(),
        ))
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("embedder", &self.embedder.name())
            .field("llm", &self.llm.model())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(5), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(64), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[tokio::test]
    async fn test_missing_groq_key_fails_fast() {
        let mut config = RagConfig::default();
        config.llm.api_key_env = "RESEARCH_RAG_TEST_UNSET_KEY".to_string();
        std::env::remove_var("RESEARCH_RAG_TEST_UNSET_KEY");

        let err = ModelContext::from_config(&config).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ref name) if name == "RESEARCH_RAG_TEST_UNSET_KEY"));
    }
}
