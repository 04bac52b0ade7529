//! Prompt templates for answer synthesis and metric extraction

use crate::providers::{ChatMessage, VectorSearchResult};
use crate::types::ExtractionResponse;

/// System prompt for metric extraction
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a Data Science Assistant. Extract statistical findings from the text.";

/// Prompt builder for RAG queries and extraction
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved nodes as a context block, each headed by its metadata
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|result| {
                let source = &result.chunk.source;
                let mut header = String::new();
                if let Some(label) = &source.page_label {
                    header.push_str(&format!("page_label: {}\n", label));
                }
                header.push_str(&format!("file_name: {}\n", source.filename));

                format!("{}\n{}", header, result.chunk.content.trim())
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the question-answering prompt over retrieved context
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            "Context information is below.\n\
             ---------------------\n\
             {context}\n\
             ---------------------\n\
             Given the context information and not prior knowledge, answer the query.\n\
             Query: {question}\n\
             Answer: ",
            context = context,
            question = question.trim()
        )
    }

    /// Build the single-turn messages for answering a question
    pub fn rag_messages(question: &str, results: &[VectorSearchResult]) -> Vec<ChatMessage> {
        let context = Self::build_context(results);
        vec![ChatMessage::user(Self::build_rag_prompt(question, &context))]
    }

    /// Build the extraction messages: role prompt plus the schema, then the page text
    pub fn extraction_messages(text: &str) -> Vec<ChatMessage> {
        let schema = serde_json::to_string_pretty(&ExtractionResponse::json_schema())
            .unwrap_or_default();

        vec![
            ChatMessage::system(format!(
                "{}\n\nRespond with a single JSON object that matches this JSON schema:\n{}\n\
                 Use an empty \"metrics\" array when the text reports no numeric findings.",
                EXTRACTION_SYSTEM_PROMPT, schema
            )),
            ChatMessage::user(format!("Extract metrics:\n\n{}", text)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChatRole;
    use crate::types::{Chunk, ChunkSource, FileType};

    fn result(text: &str, page: &str) -> VectorSearchResult {
        VectorSearchResult {
            chunk: Chunk::new(
                format!("papers/a.pdf_part_{}", page),
                text.to_string(),
                ChunkSource {
                    filename: "a.pdf".to_string(),
                    file_type: FileType::Pdf,
                    page_number: page.parse().ok(),
                    page_label: Some(page.to_string()),
                },
                0,
                text.len(),
                0,
            ),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_context_carries_page_labels() {
        let context = PromptBuilder::build_context(&[
            result("Accuracy was 94.5%.", "3"),
            result("Latency fell to 12 ms.", "4"),
        ]);

        assert!(context.contains("page_label: 3\nfile_name: a.pdf\n\nAccuracy was 94.5%."));
        assert!(context.contains("page_label: 4"));
    }

    #[test]
    fn test_rag_prompt_shape() {
        let prompt = PromptBuilder::build_rag_prompt("  What was the accuracy? ", "CTX");
        assert!(prompt.contains("---------------------\nCTX\n---------------------"));
        assert!(prompt.ends_with("Query: What was the accuracy?\nAnswer: "));
    }

    #[test]
    fn test_extraction_messages() {
        let messages = PromptBuilder::extraction_messages("Accuracy was 94.5% in 2023.");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.starts_with(EXTRACTION_SYSTEM_PROMPT));
        assert!(messages[0].content.contains("\"metric_value\""));
        assert_eq!(messages[1].content, "Extract metrics:\n\nAccuracy was 94.5% in 2023.");
    }
}
