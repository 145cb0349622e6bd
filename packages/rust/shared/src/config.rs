//! Application configuration for PartnerScout.
//!
//! User config lives at `~/.partnerscout/partnerscout.toml`.
//! Environment overrides are applied once by the CLI at startup; library code
//! only ever sees the resolved [`AppConfig`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};
use crate::types::SearchDepth;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "partnerscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".partnerscout";

// ---------------------------------------------------------------------------
// Config structs (matching partnerscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Web-search backend settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Enrichment pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Model comparison settings.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Use the OpenAI-compatible backend (otherwise Ollama).
    #[serde(default = "default_true")]
    pub use_openai: bool,

    /// OpenAI-compatible API base URL.
    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,

    /// Model used with the OpenAI-compatible backend.
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Name of the env var holding the OpenAI API key (never store the key itself).
    #[serde(default = "default_openai_key_env")]
    pub openai_api_key_env: String,

    /// Ollama server base URL.
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,

    /// Model used with the Ollama backend.
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Request timeout in seconds (local models can be slow).
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature; provider default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum characters of source text embedded in a prompt.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            use_openai: true,
            openai_endpoint: default_openai_endpoint(),
            openai_model: default_openai_model(),
            openai_api_key_env: default_openai_key_env(),
            ollama_endpoint: default_ollama_endpoint(),
            ollama_model: default_ollama_model(),
            timeout_secs: default_llm_timeout(),
            temperature: None,
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_openai_model() -> String {
    "gpt-4o".into()
}
fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_model() -> String {
    "llama3".into()
}
fn default_llm_timeout() -> u64 {
    300
}
fn default_max_content_chars() -> usize {
    12_000
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Tavily API base URL.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the Tavily API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Result count used when a caller does not ask for a specific number.
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,

    /// Search depth sent with every query.
    #[serde(default)]
    pub search_depth: SearchDepth,

    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            default_max_results: default_max_results(),
            search_depth: SearchDepth::default(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.tavily.com".into()
}
fn default_search_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_max_results() -> usize {
    1
}
fn default_search_timeout() -> u64 {
    30
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sustained request rate across search queries / records. `0` disables pacing.
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Retries for transient provider failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries, doubled on each attempt.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Open-web queries issued by a discovery run, in order.
    #[serde(default = "default_discovery_queries")]
    pub discovery_queries: Vec<String>,

    /// Results requested per discovery query.
    #[serde(default = "default_results_per_query")]
    pub max_results_per_query: usize,

    /// Results requested when looking up a known partnership.
    #[serde(default = "default_lookup_results")]
    pub lookup_max_results: usize,

    /// Recency window for discovery searches, in days.
    #[serde(default = "default_days_back")]
    pub days_back: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            discovery_queries: default_discovery_queries(),
            max_results_per_query: default_results_per_query(),
            lookup_max_results: default_lookup_results(),
            days_back: default_days_back(),
        }
    }
}

fn default_rps() -> u32 {
    1
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff() -> u64 {
    500
}
fn default_discovery_queries() -> Vec<String> {
    vec!["company announces AI partnership with company".into()]
}
fn default_results_per_query() -> usize {
    5
}
fn default_lookup_results() -> usize {
    3
}
fn default_days_back() -> u32 {
    30
}

/// `[benchmark]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Ollama models compared, in order.
    #[serde(default = "default_ollama_models")]
    pub ollama_models: Vec<String>,

    /// OpenAI models compared after the Ollama ones.
    #[serde(default = "default_openai_models")]
    pub openai_models: Vec<String>,

    /// Instruction prepended to every record's raw content.
    #[serde(default = "default_benchmark_prompt")]
    pub prompt: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            ollama_models: default_ollama_models(),
            openai_models: default_openai_models(),
            prompt: default_benchmark_prompt(),
        }
    }
}

fn default_ollama_models() -> Vec<String> {
    vec![
        "gemma3:1b".into(),
        "llama3.2:latest".into(),
        "phi4:latest".into(),
    ]
}
fn default_openai_models() -> Vec<String> {
    vec!["gpt-4o".into()]
}
fn default_benchmark_prompt() -> String {
    "Summarize the following AI partnership announcement in one sentence:".into()
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Apply environment overrides through `lookup`.
    ///
    /// Supported variables:
    /// - `USE_OPENAI`: "true" / "false"
    /// - `OPENAI_MODEL`: OpenAI-compatible model name
    /// - `OLLAMA_MODEL`: Ollama model name
    /// - `OLLAMA_URL`: Ollama base URL
    /// - `TAVILY_MAX_RESULTS`: default search result count
    ///
    /// Takes a lookup function so the CLI can pass `std::env::var` once at
    /// startup and tests can pass a map.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("USE_OPENAI") {
            self.llm.use_openai = val.trim().eq_ignore_ascii_case("true") || val.trim() == "1";
        }
        if let Some(val) = lookup("OPENAI_MODEL") {
            self.llm.openai_model = val;
        }
        if let Some(val) = lookup("OLLAMA_MODEL") {
            self.llm.ollama_model = val;
        }
        if let Some(val) = lookup("OLLAMA_URL") {
            self.llm.ollama_endpoint = val;
        }
        if let Some(val) = lookup("TAVILY_MAX_RESULTS") {
            match val.trim().parse() {
                Ok(n) => self.search.default_max_results = n,
                Err(_) => tracing::warn!(value = %val, "ignoring non-numeric TAVILY_MAX_RESULTS"),
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.partnerscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| ScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.partnerscout/partnerscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve a secret from the env var named `var_name` via `lookup`.
///
/// A missing or empty value is a configuration error.
pub fn resolve_secret<F>(var_name: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ScoutError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}
