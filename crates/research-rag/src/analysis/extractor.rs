//! LLM-backed extraction of numeric research findings

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{ChatRequest, LlmProvider};
use crate::types::{Document, ExtractionResponse, ResearchMetric};

/// A page whose extraction call failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    /// 1-based position of the page in the loaded batch
    pub page: usize,
    pub filename: String,
    pub page_label: String,
    pub error: String,
}

/// Metrics found on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    /// 1-based position of the page in the loaded batch
    pub page: usize,
    pub filename: String,
    pub page_label: String,
    pub metrics: Vec<ResearchMetric>,
}

/// Outcome of running the extractor over a batch of pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRun {
    /// Pages that produced at least one metric
    pub pages: Vec<PageMetrics>,
    pub failures: Vec<PageFailure>,
    pub pages_processed: usize,
}

impl ExtractionRun {
    /// All metrics in page order
    pub fn metrics(&self) -> impl Iterator<Item = &ResearchMetric> {
        self.pages.iter().flat_map(|p| p.metrics.iter())
    }
}

/// Extracts [`ResearchMetric`]s from page text with one JSON-mode LLM call per page
pub struct MetricExtractor {
    llm: Arc<dyn LlmProvider>,
    char_limit: usize,
}

impl MetricExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &AnalyticsConfig) -> Self {
        Self {
            llm,
            char_limit: config.extract_char_limit,
        }
    }

    /// Extract metrics from the leading `extract_char_limit` characters of `text`
    pub async fn extract(&self, text: &str) -> Result<Vec<ResearchMetric>> {
        let text = truncate_chars(text, self.char_limit);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = ChatRequest::new(PromptBuilder::extraction_messages(text)).json();
        let reply = self.llm.chat(request).await?;

        parse_extraction_reply(&reply)
    }

    /// Run [`extract`](Self::extract) over every page, recording failures and continuing
    pub async fn extract_all(&self, documents: &[Document]) -> ExtractionRun {
        self.extract_all_with_progress(documents, |_, _| {}).await
    }

    /// Like [`extract_all`](Self::extract_all), calling `on_page(done, total)` after each page
    pub async fn extract_all_with_progress<F>(
        &self,
        documents: &[Document],
        mut on_page: F,
    ) -> ExtractionRun
    where
        F: FnMut(usize, usize),
    {
        let total = documents.len();
        let mut run = ExtractionRun::default();

        for (i, doc) in documents.iter().enumerate() {
            let page = i + 1;

            match self.extract(&doc.text).await {
                Ok(metrics) if metrics.is_empty() => {}
                Ok(metrics) => {
                    tracing::debug!("Page {} ({}): {} metrics", page, doc.filename, metrics.len());
                    run.pages.push(PageMetrics {
                        page,
                        filename: doc.filename.clone(),
                        page_label: doc.page_label.clone(),
                        metrics,
                    });
                }
                Err(e) => {
                    tracing::warn!("Extraction failed for page {} of {}: {}", page, doc.filename, e);
                    run.failures.push(PageFailure {
                        page,
                        filename: doc.filename.clone(),
                        page_label: doc.page_label.clone(),
                        error: e.to_string(),
                    });
                }
            }

            run.pages_processed = page;
            on_page(page, total);
        }

        tracing::info!(
            "Extracted {} metrics from {} pages ({} failed)",
            run.metrics().count(),
            run.pages_processed,
            run.failures.len()
        );

        run
    }
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse a model reply into metrics.
///
/// Accepts the schema object, a bare array of metrics or a single metric
/// object, optionally wrapped in a Markdown code fence or surrounding prose.
pub fn parse_extraction_reply(reply: &str) -> Result<Vec<ResearchMetric>> {
    let body = strip_code_fence(reply.trim());

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(first) => embedded_json(body)
            .and_then(|slice| serde_json::from_str(slice).ok())
            .ok_or_else(|| Error::extraction(format!("reply is not JSON: {}", first)))?,
    };

    let (has_metrics, is_metric, is_empty) = match value.as_object() {
        Some(map) => (
            map.contains_key("metrics"),
            map.contains_key("metric_name"),
            map.is_empty(),
        ),
        None => (false, false, false),
    };

    let metrics: Vec<ResearchMetric> = if value.is_array() {
        serde_json::from_value(value)
            .map_err(|e| Error::extraction(format!("invalid metric list: {}", e)))?
    } else if has_metrics {
        serde_json::from_value::<ExtractionResponse>(value)
            .map_err(|e| Error::extraction(format!("reply does not match schema: {}", e)))?
            .metrics
    } else if is_metric {
        vec![serde_json::from_value(value)
            .map_err(|e| Error::extraction(format!("invalid metric: {}", e)))?]
    } else if is_empty {
        Vec::new()
    } else {
        return Err(Error::extraction(format!(
            "reply does not match schema: {}",
            truncate_chars(&value.to_string(), 120)
        )));
    };

    Ok(metrics)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn embedded_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
