//! Prompt construction and citation snippets

pub mod citation;
pub mod prompt;

pub use citation::{highlight_snippet, query_terms, truncate_snippet};
pub use prompt::{PromptBuilder, EXTRACTION_SYSTEM_PROMPT};
