//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Chunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched node
    pub chunk: Chunk,
    /// Cosine similarity, higher is more similar
    pub similarity: f32,
}

/// Trait for vector storage and similarity search over named collections
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create a collection, or clear it if it already exists
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Insert or replace nodes; every node must carry an embedding
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return up to `top_k` nodes ordered by descending similarity
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Number of nodes in a collection
    async fn len(&self, collection: &str) -> Result<usize>;

    /// Whether a collection holds no nodes
    async fn is_empty(&self, collection: &str) -> Result<bool> {
        Ok(self.len(collection).await? == 0)
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}
