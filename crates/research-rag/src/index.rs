//! Vector index construction over page documents

use std::sync::Arc;
use std::time::Instant;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::ingestion::NodeSplitter;
use crate::providers::{
    EmbeddingProvider, InMemoryVectorStore, VectorSearchResult, VectorStoreProvider,
};
use crate::types::Document;

/// Nodes embedded per provider call
const EMBED_BATCH: usize = 32;

/// Builds a fresh in-memory index from documents
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    config: IndexConfig,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: &IndexConfig) -> Self {
        Self {
            embedder,
            config: config.clone(),
        }
    }

    /// Split, embed and store `documents` in a new store.
    ///
    /// An empty document list yields an empty index that can still be queried.
    pub async fn build(&self, documents: Vec<Document>) -> Result<VectorIndex> {
        let start = Instant::now();
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
        let collection = self.config.collection_name.clone();

        store
            .create_collection(&collection, self.embedder.dimensions())
            .await?;

        let splitter = NodeSplitter::new(self.config.chunk_size, self.config.chunk_overlap);
        let mut chunks = splitter.split_documents(&documents);

        tracing::info!(
            "Indexing {} nodes from {} pages into '{}'",
            chunks.len(),
            documents.len(),
            collection
        );

        for batch in chunks.chunks_mut(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} embeddings for {} nodes",
                    self.embedder.name(),
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
        }

        store.upsert(&collection, &chunks).await?;

        tracing::info!(
            "Index ready: {} nodes in {}ms",
            chunks.len(),
            start.elapsed().as_millis()
        );

        Ok(VectorIndex {
            store,
            collection,
            embedder: Arc::clone(&self.embedder),
            node_count: chunks.len(),
            documents,
        })
    }
}

/// A built index: the store, its collection and the documents it covers
pub struct VectorIndex {
    store: Arc<dyn VectorStoreProvider>,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    documents: Vec<Document>,
    node_count: usize,
}

impl VectorIndex {
    /// Embed `question` and return the `top_k` most similar nodes
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<VectorSearchResult>> {
        if self.node_count == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(question).await?;
        self.store.search(&self.collection, &embedding, top_k).await
    }

    /// Page documents the index was built from
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn page_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("collection", &self.collection)
            .field("pages", &self.documents.len())
            .field("nodes", &self.node_count)
            .finish()
    }
}

