//! OpenAI chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use partnerscout_shared::{LlmConfig, Result, ScoutError};

use crate::{TextGenerator, as_text};

pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig, model: &str, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoutError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.openai_endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Provider(format!("openai: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ScoutError::config(format!(
                "openai rejected the API key (HTTP {status})"
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(ScoutError::Provider(format!("openai: HTTP {status}: {snippet}")));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ScoutError::parse(format!("openai response: {e}")))?;

        let message = parsed
            .pointer("/choices/0/message")
            .ok_or_else(|| ScoutError::parse("openai response has no choices"))?;
        let text = as_text(message)?;
        debug!(len = text.len(), "completion received");
        Ok(text.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
