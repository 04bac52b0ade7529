//! Groq chat-completion provider (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::backoff_delay;
use super::llm::{ChatMessage, ChatRequest, LlmProvider};

/// Groq LLM provider using bearer-token auth
pub struct GroqLlm {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GroqLlm {
    /// Create a provider, reading the API key named by `config.api_key_env`
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Create a provider with an explicit key
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential(config.api_key_env.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn complete_once(&self, body: &CompletionBody<'_>) -> Result<String> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = "groq", error = %e, "request failed");
                Error::llm(format!("Groq request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);

            tracing::error!(provider = "groq", %status, "API error");
            return Err(Error::llm(format!("Groq returned {}: {}", status, detail)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse Groq response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::llm("Groq returned no completion"))
    }
}

#[async_trait]
impl LlmProvider for GroqLlm {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            json_mode = request.json_mode,
            "groq chat completion"
        );

        let mut attempt = 0;
        loop {
            match self.complete_once(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "Groq request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_missing_credential() {
        let err = GroqLlm::with_api_key(&LlmConfig::default(), "  ").err().unwrap();
        assert!(matches!(err, Error::MissingCredential(ref k) if k == "GROQ_API_KEY"));
    }

    #[test]
    fn test_json_mode_body() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionBody {
            model: "llama-3.3-70b-versatile",
            messages: &messages,
            temperature: 0.1,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn test_completions_url() {
        let llm = GroqLlm::with_api_key(&LlmConfig::default(), "gsk_test").unwrap();
        assert_eq!(
            llm.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(llm.model(), "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_llm_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            timeout_secs: 1,
            ..LlmConfig::default()
        };
        let llm = GroqLlm::with_api_key(&config, "gsk_test").unwrap();
        let err = llm
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }
}
