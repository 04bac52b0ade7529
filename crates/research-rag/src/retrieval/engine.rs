//! Retrieve-then-synthesize query engine

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::index::VectorIndex;
use crate::providers::{ChatRequest, LlmProvider};
use crate::types::{QueryResponse, SourceNode};

/// Nodes retrieved per question unless configured otherwise
pub const DEFAULT_TOP_K: usize = 5;

/// Answers questions against one index
pub struct QueryEngine<'a> {
    index: &'a VectorIndex,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a VectorIndex, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            index,
            llm,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of retrieved nodes
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Answer `question` from the top-k nodes with exactly one LLM call.
    ///
    /// An empty index returns a warning response without calling the LLM.
    pub async fn query(&self, question: &str) -> Result<QueryResponse> {
        let start = Instant::now();
        let question = question.trim();

        if question.is_empty() {
            return Err(Error::InvalidRequest("Question must not be empty".to_string()));
        }

        if self.index.is_empty() {
            tracing::warn!("Query against empty index '{}'", self.index.collection());
            return Ok(QueryResponse::empty_index(start.elapsed().as_millis() as u64));
        }

        let results = self.index.retrieve(question, self.top_k).await?;
        tracing::debug!("Retrieved {} nodes for question", results.len());

        let request = ChatRequest::new(PromptBuilder::rag_messages(question, &results));
        let answer = self.llm.chat(request).await.map_err(|e| match e {
            Error::Llm(_) => e,
            other => Error::Llm(other.to_string()),
        })?;

        let sources = results
            .iter()
            .map(|r| SourceNode::from_chunk(&r.chunk, r.similarity))
            .collect();

        let elapsed = start.elapsed().as_millis() as u64;
        tracing::info!("Answered question in {}ms using {}", elapsed, self.llm.model());

        Ok(QueryResponse::new(answer.trim().to_string(), sources, elapsed))
    }
}
