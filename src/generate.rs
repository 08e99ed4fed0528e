//! Language-model adapter abstraction and implementations.
//!
//! Defines the [`Generator`] trait and concrete backends:
//! - **[`OpenAiGenerator`]** — calls the OpenAI chat completions API.
//! - **[`OllamaGenerator`]** — calls a local Ollama instance's `/api/generate` endpoint.
//!
//! Generation failures and timeouts surface as
//! [`PipelineError::Generation`]. As with embedding, retry/backoff lives
//! inside the adapter; the query engine propagates failures unchanged.

use async_trait::async_trait;

use crate::config::AdapterConfig;
use crate::embedding::post_with_backoff;
use crate::error::PipelineError;

/// An external capability that completes a text prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Produce a completion for `prompt`, returning the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}

impl std::fmt::Debug for dyn Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("model", &self.model_name())
            .finish()
    }
}

/// Create the appropriate [`Generator`] based on configuration.
pub fn create_generator(config: &AdapterConfig) -> Result<Box<dyn Generator>, PipelineError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => Err(PipelineError::Configuration(format!(
            "unknown generation provider: '{}'",
            other
        ))),
    }
}

// ============ OpenAI ============

/// Generation adapter for the OpenAI `POST /v1/chat/completions` endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiGenerator {
    model: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAiGenerator {
    pub fn new(config: &AdapterConfig) -> Result<Self, PipelineError> {
        let model = config.model.clone().ok_or_else(|| {
            PipelineError::Configuration("generation.model required for OpenAI".to_string())
        })?;
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            PipelineError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self {
            model,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });
        let json = post_with_backoff(
            "https://api.openai.com/v1/chat/completions",
            &body,
            Some(&self.api_key),
            self.max_retries,
            self.timeout_secs,
            PipelineError::Generation,
        )
        .await?;

        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PipelineError::Generation("invalid OpenAI response: missing message content".into())
            })
    }
}

// ============ Ollama ============

/// Generation adapter for a local Ollama instance.
///
/// Calls `POST /api/generate` with streaming disabled on the configured
/// URL (default `http://localhost:11434`).
pub struct OllamaGenerator {
    model: String,
    url: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(config: &AdapterConfig) -> Result<Self, PipelineError> {
        let model = config.model.clone().unwrap_or_else(|| "llama3".to_string());
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        Ok(Self {
            model,
            url,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        let json = post_with_backoff(
            &format!("{}/api/generate", self.url),
            &body,
            None,
            self.max_retries,
            self.timeout_secs,
            PipelineError::Generation,
        )
        .await?;

        json.get("response")
            .and_then(|r| r.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PipelineError::Generation("invalid Ollama response: missing response field".into())
            })
    }
}
