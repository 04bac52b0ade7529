//! Request types

use serde::{Deserialize, Serialize};

/// Question for the query engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Override the number of nodes retrieved (default: from config, 5)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
}

/// Options for a metric extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsRequest {
    /// Year assigned to metrics without one (default: from config)
    #[serde(default)]
    pub fallback_year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_defaults() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"question": "What is the accuracy trend?"}"#).unwrap();
        assert_eq!(request.question, "What is the accuracy trend?");
        assert!(request.top_k.is_none());

        let request = QueryRequest::new("q").with_top_k(3);
        assert_eq!(request.top_k, Some(3));
    }

    #[test]
    fn test_metrics_request_empty_body() {
        let request: MetricsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.fallback_year.is_none());
    }
}
