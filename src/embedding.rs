//! Embedding adapter abstraction and implementations.
//!
//! Defines the [`Embedder`] trait and concrete backends:
//! - **[`OpenAiEmbedder`]** — calls the OpenAI embeddings API.
//! - **[`OllamaEmbedder`]** — calls a local Ollama instance's `/api/embed` endpoint.
//!
//! The pipeline core treats embedding as an opaque capability: vectors
//! pass through uninterpreted and no dimensionality is assumed. Transient
//! backend failures surface as [`PipelineError::EmbeddingUnavailable`];
//! retry policy belongs to the adapter, never the pipeline.
//!
//! # Retry Strategy
//!
//! Both HTTP backends use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use async_trait::async_trait;
use std::time::Duration;

use crate::config::AdapterConfig;
use crate::error::PipelineError;

/// An external capability that maps texts to fixed-dimension vectors.
///
/// One vector is returned per input text, in input order. Implementations
/// may block for seconds (network or model latency); callers await them
/// inline per request.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Embed a single query text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let vectors = self.embed(&[text.to_string()]).await?;
        vectors.into_iter().next().ok_or_else(|| {
            PipelineError::EmbeddingUnavailable("empty embedding response".to_string())
        })
    }
}

/// Create the appropriate [`Embedder`] based on configuration.
pub fn create_embedder(config: &AdapterConfig) -> Result<Box<dyn Embedder>, PipelineError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        "ollama" => Ok(Box::new(OllamaEmbedder::new(config)?)),
        other => Err(PipelineError::Configuration(format!(
            "unknown embedding provider: '{}'",
            other
        ))),
    }
}

// ============ OpenAI ============

/// Embedding adapter for the OpenAI `POST /v1/embeddings` endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedder {
    model: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAiEmbedder {
    pub fn new(config: &AdapterConfig) -> Result<Self, PipelineError> {
        let model = config.model.clone().ok_or_else(|| {
            PipelineError::Configuration("embedding.model required for OpenAI".to_string())
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
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = post_with_backoff(
            "https://api.openai.com/v1/embeddings",
            &body,
            Some(&self.api_key),
            self.max_retries,
            self.timeout_secs,
            PipelineError::EmbeddingUnavailable,
        )
        .await?;
        parse_openai_embeddings(&json)
    }
}

fn parse_openai_embeddings(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, PipelineError> {
    let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
        PipelineError::EmbeddingUnavailable("invalid OpenAI response: missing data array".into())
    })?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                PipelineError::EmbeddingUnavailable(
                    "invalid OpenAI response: missing embedding".into(),
                )
            })?;
        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vec);
    }
    Ok(embeddings)
}

// ============ Ollama ============

/// Embedding adapter for a local Ollama instance.
///
/// Calls `POST /api/embed` on the configured URL (default
/// `http://localhost:11434`). Requires an embedding model to be pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEmbedder {
    model: String,
    url: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OllamaEmbedder {
    pub fn new(config: &AdapterConfig) -> Result<Self, PipelineError> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| "nomic-embed-text".to_string());
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
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = post_with_backoff(
            &format!("{}/api/embed", self.url),
            &body,
            None,
            self.max_retries,
            self.timeout_secs,
            PipelineError::EmbeddingUnavailable,
        )
        .await?;
        parse_ollama_embeddings(&json)
    }
}

fn parse_ollama_embeddings(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, PipelineError> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            PipelineError::EmbeddingUnavailable(
                "invalid Ollama response: missing embeddings array".into(),
            )
        })?;

    let mut result = Vec::with_capacity(embeddings.len());
    for embedding in embeddings {
        let vec: Vec<f32> = embedding
            .as_array()
            .ok_or_else(|| {
                PipelineError::EmbeddingUnavailable(
                    "invalid Ollama response: embedding is not an array".into(),
                )
            })?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        result.push(vec);
    }
    Ok(result)
}

// ============ Shared HTTP plumbing ============

/// POST a JSON body with exponential backoff on 429/5xx/network errors,
/// mapping the terminal failure through `make_err`.
pub(crate) async fn post_with_backoff(
    url: &str,
    body: &serde_json::Value,
    bearer: Option<&str>,
    max_retries: u32,
    timeout_secs: u64,
    make_err: fn(String) -> PipelineError,
) -> Result<serde_json::Value, PipelineError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| make_err(e.to_string()))?;

    let mut last_err: Option<PipelineError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut request = client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = bearer {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json().await.map_err(|e| make_err(e.to_string()));
                }

                // Rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(make_err(format!("{} error {}: {}", url, status, body_text)));
                    continue;
                }

                // Client error (not 429): don't retry
                let body_text = response.text().await.unwrap_or_default();
                return Err(make_err(format!("{} error {}: {}", url, status, body_text)));
            }
            Err(e) => {
                last_err = Some(make_err(format!("{}: {}", url, e)));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| make_err("request failed after retries".to_string())))
}

// ============ Vector math ============

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Compute Euclidean distance between two embedding vectors.
///
/// Returns `f32::INFINITY` for vectors of different lengths so that a
/// malformed pair never ranks as a near neighbor.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
