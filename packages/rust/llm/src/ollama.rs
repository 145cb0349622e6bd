//! Local Ollama backend (`/api/generate`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use partnerscout_shared::{LlmConfig, Result, ScoutError};

use crate::{TextGenerator, as_text};

pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoutError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.ollama_endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: prompt,
            stream: false,
            options: self
                .temperature
                .map(|temperature| GenerateOptions { temperature }),
        };

        let url = format!("{}/api/generate", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Provider(format!("ollama: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(ScoutError::Provider(format!("ollama: HTTP {status}: {snippet}")));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| ScoutError::parse(format!("ollama response: {e}")))?;

        let text = as_text(&parsed)?;
        debug!(len = text.len(), "generation received");
        Ok(text.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
