//! In-memory vector store with exact cosine search
//!
//! Every index build gets its own store, so nothing persists between uploads.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

#[derive(Debug, Default)]
struct Collection {
    dimensions: usize,
    chunks: Vec<Chunk>,
    /// Node id -> position in `chunks`
    positions: HashMap<uuid::Uuid, usize>,
}

/// Ephemeral vector store keyed by collection name
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn missing(collection: &str) -> Error {
    Error::vector_db(format!("collection '{}' does not exist", collection))
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.collections.write().insert(
            name.to_string(),
            Collection {
                dimensions,
                ..Default::default()
            },
        );
        tracing::debug!("Created collection '{}' ({} dims)", name, dimensions);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write();
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;

        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::vector_db(format!("node {} has no embedding", chunk.id)));
            }
            if store.dimensions > 0 && chunk.embedding.len() != store.dimensions {
                return Err(Error::vector_db(format!(
                    "node {} has {} dimensions, collection '{}' expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    collection,
                    store.dimensions
                )));
            }

            match store.positions.get(&chunk.id) {
                Some(&pos) => store.chunks[pos] = chunk.clone(),
                None => {
                    store.positions.insert(chunk.id, store.chunks.len());
                    store.chunks.push(chunk.clone());
                }
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let collections = self.collections.read();
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut scored: Vec<VectorSearchResult> = store
            .chunks
            .iter()
            .map(|chunk| VectorSearchResult {
                similarity: cosine_similarity(&chunk.embedding, embedding),
                chunk: chunk.clone(),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn len(&self, collection: &str) -> Result<usize> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.chunks.len())
            .ok_or_else(|| missing(collection))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
