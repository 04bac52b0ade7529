//! Page documents and retrievable nodes with source tracking for citations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// HTML document
    Html,
    /// CSV file
    Csv,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "csv" => Self::Csv,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a file name or path
    pub fn from_filename(filename: &str) -> Self {
        std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// One loaded page of text
///
/// Documents are produced by the directory loader and never modified
/// afterwards; they live as long as the session that loaded them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier derived from the source path (`<path>_part_<n>`)
    pub id: String,
    /// Source file name
    pub filename: String,
    /// Path relative to the loaded directory
    pub file_path: PathBuf,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Page label shown in citations
    pub page_label: String,
    /// Raw page text
    pub text: String,
    /// Loader metadata (file name, path, mime type, size, content hash)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Build the stable identifier for one page of a file
    pub fn page_id(file_path: &std::path::Path, page_index: usize) -> String {
        format!("{}_part_{}", file_path.to_string_lossy(), page_index)
    }

    /// Create a new page document
    pub fn new(
        file_path: PathBuf,
        file_type: FileType,
        page_index: usize,
        page_number: u32,
        text: String,
    ) -> Self {
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string());

        Self {
            id: Self::page_id(&file_path, page_index),
            filename,
            file_path,
            file_type,
            page_number,
            page_label: page_number.to_string(),
            text,
            metadata: HashMap::new(),
        }
    }
}

/// Source information for a node (used for citations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source file name
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed)
    pub page_number: Option<u32>,
    /// Page label
    pub page_label: Option<String>,
}

impl ChunkSource {
    /// Source info for a page document
    pub fn from_document(doc: &Document) -> Self {
        Self {
            filename: doc.filename.clone(),
            file_type: doc.file_type.clone(),
            page_number: Some(doc.page_number),
            page_label: Some(doc.page_label.clone()),
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        let mut parts = vec![self.filename.clone()];

        if let Some(label) = &self.page_label {
            parts.push(format!("Page {}", label));
        }

        parts.join(", ")
    }
}

/// A node of text split from a page document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique node ID
    pub id: Uuid,
    /// Parent page document ID
    pub document_id: String,
    /// Text content
    pub content: String,
    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information for citations
    pub source: ChunkSource,
    /// Character position in the page
    pub char_start: usize,
    pub char_end: usize,
    /// Node index within the index build
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new node
    pub fn new(
        document_id: String,
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            embedding: Vec::new(),
            source,
            char_start,
            char_end,
            chunk_index,
        }
    }
}
