//! Error taxonomy for the ingestion and query pipeline.
//!
//! Every core operation either succeeds or fails with exactly one of these
//! kinds. The pipeline never substitutes a degraded default (an empty
//! answer, a partial index presented as complete) without signaling the
//! failure kind to the caller, which owns user-facing presentation.

use thiserror::Error;

/// Failure kinds produced by the pipeline core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid chunking or retrieval parameters. Programmer error; fatal
    /// for the session rather than recoverable per request.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A single document could not be read (corrupt, encrypted, or an
    /// unsupported format). Recoverable: the batch skips it and continues.
    #[error("unreadable document '{name}': {reason}")]
    UnreadableDocument { name: String, reason: String },

    /// No chunks were produced from any document, so there is no content
    /// to answer questions against.
    #[error("no readable content: cannot answer without at least one indexed chunk")]
    EmptyCorpus,

    /// The embedding backend failed or timed out. Surfaced verbatim; the
    /// core does not retry (retry policy lives inside the adapter).
    #[error("embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The language-model backend failed or timed out. Surfaced verbatim;
    /// the core does not retry.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Retrieval could not be performed, e.g. a question was asked before
    /// any document set was processed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),
}

impl PipelineError {
    /// True for failures that skip one document without aborting the batch.
    pub fn is_per_document(&self) -> bool {
        matches!(self, PipelineError::UnreadableDocument { .. })
    }
}
