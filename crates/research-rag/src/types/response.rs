//! Response types for queries and uploads

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::document::{Chunk, Document, FileType};
use crate::generation::citation::truncate_snippet;

/// Characters of node text shown in a source snippet
pub const SNIPPET_CHARS: usize = 200;

/// A retrieved node cited in an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceNode {
    /// Node ID
    pub chunk_id: Uuid,
    /// Page document ID
    pub document_id: String,
    /// Source filename
    pub filename: String,
    /// Page label
    pub page_label: Option<String>,
    /// Full node text
    pub text: String,
    /// Leading part of the node text for display
    pub snippet: String,
    /// Similarity score (cosine, higher is more similar)
    pub score: f32,
}

impl SourceNode {
    /// Create a source from a retrieved node and its similarity score
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id.clone(),
            filename: chunk.source.filename.clone(),
            page_label: chunk.source.page_label.clone(),
            text: chunk.content.clone(),
            snippet: truncate_snippet(&chunk.content, SNIPPET_CHARS),
            score,
        }
    }

    /// Format as a one-line caption (`Page 3: ...`)
    pub fn caption(&self) -> String {
        format!(
            "Page {}: {}",
            self.page_label.as_deref().unwrap_or("?"),
            self.snippet
        )
    }
}

/// Response from a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Synthesized answer
    pub answer: String,
    /// Retrieved nodes, most similar first
    pub sources: Vec<SourceNode>,
    /// Set when the answer could not be grounded (e.g. empty index)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Create a new query response
    pub fn new(answer: String, sources: Vec<SourceNode>, processing_time_ms: u64) -> Self {
        Self {
            answer,
            sources,
            warning: None,
            processing_time_ms,
        }
    }

    /// Response for an index that holds no nodes
    pub fn empty_index(processing_time_ms: u64) -> Self {
        Self {
            answer: String::new(),
            sources: Vec::new(),
            warning: Some(
                "The index is empty. Please upload and process documents first!".to_string(),
            ),
            processing_time_ms,
        }
    }

    /// Whether this response carries a warning instead of a grounded answer
    pub fn is_warning(&self) -> bool {
        self.warning.is_some()
    }
}

/// Summary of one loaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    /// Filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Number of pages loaded
    pub pages: usize,
    /// Page document IDs
    pub document_ids: Vec<String>,
}

impl FileSummary {
    /// Group page documents by file, preserving load order
    pub fn from_documents(documents: &[Document]) -> Vec<Self> {
        let mut order = Vec::new();
        let mut files: BTreeMap<String, FileSummary> = BTreeMap::new();

        for doc in documents {
            let key = doc.file_path.to_string_lossy().to_string();
            let entry = files.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                FileSummary {
                    filename: doc.filename.clone(),
                    file_type: doc.file_type.clone(),
                    pages: 0,
                    document_ids: Vec::new(),
                }
            });
            entry.pages += 1;
            entry.document_ids.push(doc.id.clone());
        }

        order
            .into_iter()
            .filter_map(|key| files.remove(&key))
            .collect()
    }
}

/// Response from processing an upload batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Files written to the staging directory
    pub files: Vec<FileSummary>,
    /// Total pages loaded
    pub total_pages: usize,
    /// Total nodes indexed
    pub total_nodes: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Uploaded files that were rejected
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rejected: Vec<RejectedFile>,
}

/// An uploaded file that was not staged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedFile {
    /// Filename as uploaded
    pub filename: String,
    /// Reason
    pub reason: String,
}

/// Summary of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID
    pub session_id: Uuid,
    /// Creation time
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Whether an index has been built
    pub indexed: bool,
    /// Pages in the current index
    pub total_pages: usize,
    /// Nodes in the current index
    pub total_nodes: usize,
    /// Files in the current batch
    pub files: Vec<FileSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkSource;
    use std::path::PathBuf;

    #[test]
    fn test_source_caption_truncates() {
        let doc = Document::new(PathBuf::from("p.pdf"), FileType::Pdf, 0, 7, String::new());
        let chunk = Chunk::new(
            doc.id.clone(),
            "word ".repeat(100),
            ChunkSource::from_document(&doc),
            0,
            500,
            0,
        );
        let source = SourceNode::from_chunk(&chunk, 0.8);

        assert!(source.caption().starts_with("Page 7: word"));
        assert!(source.snippet.ends_with("..."));
        assert!(source.snippet.len() <= SNIPPET_CHARS + 3);
        assert_eq!(source.text.len(), 500);
    }

    #[test]
    fn test_file_summary_groups_pages() {
        let docs = vec![
            Document::new(PathBuf::from("b.pdf"), FileType::Pdf, 0, 1, "x".into()),
            Document::new(PathBuf::from("b.pdf"), FileType::Pdf, 1, 2, "y".into()),
            Document::new(PathBuf::from("a.pdf"), FileType::Pdf, 0, 1, "z".into()),
        ];
        let files = FileSummary::from_documents(&docs);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "b.pdf");
        assert_eq!(files[0].pages, 2);
        assert_eq!(files[1].document_ids, vec!["a.pdf_part_0".to_string()]);
    }

    #[test]
    fn test_empty_index_response_is_warning() {
        let response = QueryResponse::empty_index(3);
        assert!(response.is_warning());
        assert!(response.sources.is_empty());
    }
}
