//! Deterministic model doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use research_rag::config::RagConfig;
use research_rag::error::{Error, Result};
use research_rag::providers::{ChatRequest, EmbeddingProvider, LlmProvider};
use research_rag::ModelContext;

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lowercase word increments one hashed bucket
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    fn bucket(word: &str) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (hash % DIMENSIONS as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            vector[Self::bucket(&word.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Keyword embedder whose backend can be switched off mid-test
#[derive(Default)]
pub struct SwitchableEmbedder {
    failing: AtomicBool,
}

impl SwitchableEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.is_failing() {
            return Err(Error::embedding("embedding backend unavailable"));
        }
        KeywordEmbedder.embed(text).await
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.is_failing())
    }

    fn name(&self) -> &str {
        "switchable"
    }
}

type Reply = dyn Fn(&ChatRequest) -> Result<String> + Send + Sync;

/// Scripted chat model that counts its calls and keeps the last request
pub struct MockLlm {
    reply: Box<Reply>,
    calls: AtomicUsize,
    last_request: parking_lot::Mutex<Option<ChatRequest>>,
}

impl MockLlm {
    pub fn with<F>(reply: F) -> Arc<Self>
    where
        F: Fn(&ChatRequest) -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            last_request: parking_lot::Mutex::new(None),
        })
    }

    /// Always answer with `text`
    pub fn answering(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::with(move |_| Ok(text.clone()))
    }

    /// Always fail like an unreachable backend
    pub fn failing() -> Arc<Self> {
        Self::with(|_| Err(Error::llm("Groq returned 429 Too Many Requests: rate limited")))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = (self.reply)(&request);
        *self.last_request.lock() = Some(request);
        reply
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

pub fn models(llm: Arc<MockLlm>) -> ModelContext {
    ModelContext::new(Arc::new(KeywordEmbedder), llm)
}

pub fn models_with(embedder: Arc<SwitchableEmbedder>, llm: Arc<MockLlm>) -> ModelContext {
    ModelContext::new(embedder, llm)
}

/// Config staging under `data_dir` and accepting text files for fixtures
pub fn test_config(data_dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.staging.data_dir = data_dir.to_path_buf();
    config.staging.allowed_extensions = vec!["pdf".to_string(), "txt".to_string()];
    config
}

/// Reply for extraction requests: one metric per "<name> of <value>% in <year>" sentence
pub fn extraction_reply(request: &ChatRequest) -> Result<String> {
    let text = request
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();

    if text.contains("broken") {
        return Err(Error::llm("backend timed out"));
    }

    let mut metrics = Vec::new();
    if text.contains("94.5") {
        metrics.push(serde_json::json!({
            "paper_title": "Our Study", "metric_name": "Accuracy",
            "metric_value": "94.5%", "unit": "%", "year": "2023"
        }));
    }
    if text.contains("undated") {
        metrics.push(serde_json::json!({
            "paper_title": "Undated Paper", "metric_name": "F1", "metric_value": 0.87
        }));
    }

    Ok(serde_json::json!({ "metrics": metrics }).to_string())
}
