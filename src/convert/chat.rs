//! OpenAI compatible chat-completions converter

use crate::config::ConverterConfig;
use crate::convert::{
    build_conversion_prompt, build_prefix_prompt, Conversion, ConversionRequest, ConvertError,
    Converter,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Converter backed by a `/chat/completions` endpoint (OpenRouter by default)
#[derive(Debug, Clone)]
pub struct ChatCompletionsConverter {
    client: Client,
    endpoint: String,
    model: String,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl ChatCompletionsConverter {
    /// Builds a converter from configuration; an API key is required
    pub fn new(config: &ConverterConfig) -> Result<Self, ConvertError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConvertError::MissingApiKey)?;

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| ConvertError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Sends a prompt, retrying failures with exponential backoff
    async fn complete(&self, prompt: &str) -> Result<String, ConvertError> {
        let mut attempt = 0u32;
        loop {
            match self.complete_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt + 1 < self.max_attempts => {
                    let delay = self.retry_base_delay.saturating_mul(2u32.pow(attempt.min(16)));
                    tracing::debug!(
                        "Conversion attempt {}/{} failed: {}; retrying in {:?}",
                        attempt + 1,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, ConvertError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self.client.post(&self.endpoint).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ConvertError::Status { status, body });
        }

        let parsed: ChatResponse = resp.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Converter for ChatCompletionsConverter {
    async fn convert(&self, request: &ConversionRequest<'_>) -> Result<Conversion, ConvertError> {
        let prompt = build_conversion_prompt(request);
        let text = self.complete(&prompt).await?;
        Conversion::from_response(&text)
    }

    async fn infer_prefix(&self, base_url: &str, paths: &[String]) -> Result<String, ConvertError> {
        let prompt = build_prefix_prompt(base_url, paths);
        self.complete(&prompt).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
