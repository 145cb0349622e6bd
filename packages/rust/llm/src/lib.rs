//! Text-generation backends.
//!
//! Everything downstream talks to [`TextGenerator`]: a prompt goes in, plain
//! text comes out. Provider response shapes are flattened once, here, by
//! [`as_text`].

mod ollama;
mod openai;

use async_trait::async_trait;
use serde_json::Value;

use partnerscout_shared::{LlmConfig, Result, ScoutError, resolve_secret};

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

/// A text-generation provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logs and reports.
    fn model(&self) -> &str;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// Which provider family to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenAi,
    Ollama,
}

impl Backend {
    /// Backend selected by the `use_openai` switch.
    pub fn from_config(config: &LlmConfig) -> Self {
        if config.use_openai {
            Self::OpenAi
        } else {
            Self::Ollama
        }
    }
}

/// Build a generator for `backend`, optionally overriding the configured model.
///
/// `lookup` resolves the API key env var named in the config; a missing key for
/// the OpenAI backend is a [`ScoutError::Config`].
pub fn build_generator<F>(
    config: &LlmConfig,
    backend: Backend,
    model: Option<&str>,
    lookup: F,
) -> Result<Box<dyn TextGenerator>>
where
    F: Fn(&str) -> Option<String>,
{
    match backend {
        Backend::OpenAi => {
            let api_key = resolve_secret(&config.openai_api_key_env, lookup)?;
            let model = model.unwrap_or(&config.openai_model);
            Ok(Box::new(OpenAiGenerator::new(config, model, api_key)?))
        }
        Backend::Ollama => {
            let model = model.unwrap_or(&config.ollama_model);
            Ok(Box::new(OllamaGenerator::new(config, model)?))
        }
    }
}

/// Flatten a provider response value into plain text.
///
/// Accepts a bare string, an object carrying `content` / `text` / `response` /
/// `message`, or an array of content parts (concatenated in order).
pub fn as_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Array(parts) => {
            let texts: Vec<String> = parts.iter().filter_map(|p| as_text(p).ok()).collect();
            if texts.is_empty() {
                Err(ScoutError::parse("response content has no text parts"))
            } else {
                Ok(texts.concat())
            }
        }
        Value::Object(map) => ["content", "text", "response", "message"]
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
            .map(as_text)
            .unwrap_or_else(|| Err(ScoutError::parse("response object has no text field"))),
        other => Err(ScoutError::parse(format!("unexpected response shape: {other}"))),
    }
}
