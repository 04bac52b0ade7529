//! Core types for the RAG system

pub mod document;
pub mod metric;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, FileType};
pub use metric::{ExtractionResponse, ResearchMetric};
pub use query::{MetricsRequest, QueryRequest};
pub use response::{FileSummary, IngestResponse, QueryResponse, SessionSummary, SourceNode};
