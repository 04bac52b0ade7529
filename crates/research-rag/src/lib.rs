//! research-rag: question answering and metric extraction over research papers
//!
//! Uploaded PDFs are split into page documents, embedded into a fresh
//! in-memory vector index, and queried with a Groq (or Ollama) chat model.
//! The same model extracts structured [`ResearchMetric`]s from every page,
//! which are turned into a table and trend / comparison charts.

pub mod analysis;
pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use analysis::{MetricExtractor, MetricsReport};
pub use config::RagConfig;
pub use error::{Error, Result};
pub use index::{IndexBuilder, VectorIndex};
pub use ingestion::load_documents;
pub use providers::ModelContext;
pub use retrieval::QueryEngine;
pub use session::{Session, SessionManager, UploadedFile};
pub use types::{
    document::{Chunk, ChunkSource, Document, FileType},
    metric::{ExtractionResponse, ResearchMetric},
    query::QueryRequest,
    response::{QueryResponse, SourceNode},
};
