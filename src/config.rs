use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: AdapterConfig,
    #[serde(default)]
    pub generation: AdapterConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_separator")]
    pub separator: char,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separator: default_separator(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_separator() -> char {
    '\n'
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Similarity metric: `"cosine"` or `"euclidean"`.
    #[serde(default = "default_metric")]
    pub metric: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            metric: default_metric(),
        }
    }
}

fn default_top_k() -> usize {
    4
}
fn default_metric() -> String {
    "cosine".to_string()
}

/// Shared shape for the embedding and generation backend settings.
#[derive(Debug, Deserialize, Clone)]
pub struct AdapterConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TranscriptConfig {
    /// Character budget for the rendered transcript injected into prompts.
    /// `None` keeps the full history.
    #[serde(default)]
    pub max_context_chars: Option<usize>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config file if present, falling back to defaults otherwise.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }

    // Validate retrieval
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    match config.retrieval.metric.as_str() {
        "cosine" | "euclidean" => {}
        other => anyhow::bail!(
            "Unknown retrieval.metric: '{}'. Must be cosine or euclidean.",
            other
        ),
    }

    // Validate adapters
    for (section, adapter) in [
        ("embedding", &config.embedding),
        ("generation", &config.generation),
    ] {
        match adapter.provider.as_str() {
            "openai" | "ollama" => {}
            other => anyhow::bail!(
                "Unknown {}.provider: '{}'. Must be openai or ollama.",
                section,
                other
            ),
        }
        if adapter.provider == "openai" && adapter.model.is_none() {
            anyhow::bail!("{}.model must be specified for the openai provider", section);
        }
    }

    if config.transcript.max_context_chars == Some(0) {
        anyhow::bail!("transcript.max_context_chars must be > 0 when set");
    }

    Ok(())
}
