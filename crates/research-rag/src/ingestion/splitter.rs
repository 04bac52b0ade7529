//! Sentence-aware node splitting with page tracking

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, ChunkSource, Document};

/// Splits page documents into retrievable nodes
#[derive(Debug, Clone)]
pub struct NodeSplitter {
    /// Target node size in characters
    chunk_size: usize,
    /// Overlap between nodes
    overlap: usize,
}

impl NodeSplitter {
    /// Create a new splitter
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size / 2),
        }
    }

    /// Split every page; node indices run across the whole batch
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for doc in documents {
            let start_index = chunks.len() as u32;
            chunks.extend(self.split_document(doc, start_index));
        }

        chunks
    }

    /// Split one page into nodes
    pub fn split_document(&self, doc: &Document, start_index: u32) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let source = ChunkSource::from_document(doc);

        let mut current_chunk = String::new();
        let mut current_start = 0usize;
        let mut chunk_index = start_index;
        let mut char_pos = 0usize;

        for sentence in doc.text.split_sentence_bounds() {
            let sentence_len = sentence.len();

            if !current_chunk.trim().is_empty()
                && current_chunk.len() + sentence_len > self.chunk_size
            {
                chunks.push(Chunk::new(
                    doc.id.clone(),
                    current_chunk.trim().to_string(),
                    source.clone(),
                    current_start,
                    char_pos,
                    chunk_index,
                ));
                chunk_index += 1;

                let overlap_text = self.get_overlap_text(&current_chunk);
                current_start = char_pos.saturating_sub(overlap_text.len());
                current_chunk = overlap_text;
            }

            current_chunk.push_str(sentence);
            char_pos += sentence_len;
        }

        if !current_chunk.trim().is_empty() {
            chunks.push(Chunk::new(
                doc.id.clone(),
                current_chunk.trim().to_string(),
                source,
                current_start,
                char_pos,
                chunk_index,
            ));
        }

        chunks
    }

    /// Get overlap text from the end of a node
    fn get_overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let overlap_text = &text[start..];

        // Prefer starting on a sentence, then a word
        if let Some(pos) = overlap_text.find(". ") {
            return overlap_text[pos + 2..].to_string();
        }
        if let Some(pos) = overlap_text.find(' ') {
            return overlap_text[pos + 1..].to_string();
        }

        overlap_text.to_string()
    }
}

impl Default for NodeSplitter {
    fn default() -> Self {
        Self::new(1024, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;
    use std::path::PathBuf;

    fn page(text: &str, page_number: u32) -> Document {
        Document::new(
            PathBuf::from("paper.pdf"),
            FileType::Pdf,
            (page_number - 1) as usize,
            page_number,
            text.to_string(),
        )
    }

    #[test]
    fn test_short_page_is_one_node() {
        let splitter = NodeSplitter::default();
        let chunks = splitter.split_document(&page("Accuracy was 94.5% in 2023.", 1), 0);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Accuracy was 94.5% in 2023.");
        assert_eq!(chunks[0].document_id, "paper.pdf_part_0");
        assert_eq!(chunks[0].source.page_label.as_deref(), Some("1"));
    }

    #[test]
    fn test_long_page_splits_on_sentences_with_overlap() {
        let text = "The model improves accuracy on every benchmark. ".repeat(40);
        let splitter = NodeSplitter::new(300, 60);
        let chunks = splitter.split_document(&page(&text, 2), 0);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 300 + 60);
            assert!(chunk.content.ends_with('.'));
        }
        let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, (0..chunks.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_blank_pages_produce_no_nodes() {
        let splitter = NodeSplitter::default();
        let docs = vec![page("   \n ", 1), page("Results section.", 2)];
        let chunks = splitter.split_documents(&docs);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source.page_number, Some(2));
    }

    #[test]
    fn test_multibyte_overlap_boundary() {
        let text = "Précision élevée obtenue. ".repeat(30);
        let splitter = NodeSplitter::new(100, 33);
        let chunks = splitter.split_document(&page(&text, 1), 0);
        assert!(chunks.len() > 1);
    }
}
