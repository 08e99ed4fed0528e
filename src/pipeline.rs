//! Pipeline orchestration: ingestion and retrieval-augmented answering.
//!
//! [`process`] runs the build phase once per uploaded document set:
//! extract → chunk → embed → index. [`answer`] runs per question against
//! the already-built index: embed question → nearest-neighbor search →
//! prompt assembly → generation.
//!
//! Both are plain functions over explicit state (the index, the rendered
//! transcript) passed in by the caller; nothing here is ambient or
//! process-global. Re-processing builds a brand-new [`VectorIndex`] that
//! the caller swaps in wholesale, so old and new corpora never mix.

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::extract::{DocumentInput, TextExtractor};
use crate::generate::Generator;
use crate::index::{IndexEntry, SimilarityMetric, VectorIndex};

/// Characters of raw text surfaced as the ingestion preview.
pub const PREVIEW_CHARS: usize = 500;

/// A document that failed extraction and was skipped.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

/// Result of one ingestion run.
#[derive(Debug)]
pub struct IngestOutcome {
    /// First [`PREVIEW_CHARS`] characters of the concatenated raw text.
    pub preview: String,
    /// Number of chunks the text was split into.
    pub chunk_count: usize,
    /// Documents skipped because they could not be read.
    pub skipped: Vec<SkippedDocument>,
    /// The freshly built index; replaces any previous one.
    pub index: VectorIndex,
}

/// Ingest a document set and build its vector index.
///
/// Extraction failures are per-document: the offending document is
/// skipped and reported in [`IngestOutcome::skipped`] while the batch
/// continues. Page and document boundaries are not preserved in the
/// concatenated text.
///
/// # Errors
///
/// - [`PipelineError::EmptyCorpus`] when no documents were supplied, or
///   none of them yielded any chunk of text.
/// - [`PipelineError::Configuration`] for invalid chunking parameters or
///   an unknown similarity metric.
/// - [`PipelineError::EmbeddingUnavailable`] when the embedding backend
///   fails; propagated, never retried here.
pub async fn process(
    extractor: &dyn TextExtractor,
    embedder: &dyn Embedder,
    documents: &[DocumentInput],
    config: &Config,
) -> Result<IngestOutcome, PipelineError> {
    if documents.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }

    let mut raw_text = String::new();
    let mut skipped = Vec::new();

    for doc in documents {
        match extractor.extract(doc) {
            Ok(text) => raw_text.push_str(&text),
            Err(PipelineError::UnreadableDocument { name, reason }) => {
                skipped.push(SkippedDocument { name, reason });
            }
            Err(other) => return Err(other),
        }
    }

    let chunks = chunk_text(
        &raw_text,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.chunking.separator,
    )?;
    if chunks.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }

    let vectors = embedder.embed(&chunks).await?;
    if vectors.len() != chunks.len() {
        return Err(PipelineError::EmbeddingUnavailable(format!(
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let metric = SimilarityMetric::parse(&config.retrieval.metric)?;
    let entries: Vec<IndexEntry> = chunks
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (text, vector))| IndexEntry::new(i, text, vector))
        .collect();
    let index = VectorIndex::build(entries, metric)?;

    let preview: String = raw_text.chars().take(PREVIEW_CHARS).collect();

    Ok(IngestOutcome {
        preview,
        chunk_count: index.len(),
        skipped,
        index,
    })
}

/// Answer a question against a processed document set.
///
/// Embeds the question, retrieves the `k` most similar chunks, assembles
/// a prompt from optional prior conversation context plus the retrieved
/// chunk block, and returns the generator's raw response. Answers are
/// never cached: the same question against the same index is recomputed.
///
/// # Errors
///
/// - [`PipelineError::Retrieval`] when `index` is `None` (question asked
///   before any document set was processed) or `k == 0`.
/// - [`PipelineError::EmbeddingUnavailable`] / [`PipelineError::Generation`]
///   from the adapters; propagated, never retried here.
pub async fn answer(
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    index: Option<&VectorIndex>,
    question: &str,
    k: usize,
    transcript_context: Option<&str>,
) -> Result<String, PipelineError> {
    let index = index.ok_or_else(|| {
        PipelineError::Retrieval("no document set has been processed yet".to_string())
    })?;
    if k == 0 {
        return Err(PipelineError::Retrieval(
            "retrieval requires k >= 1".to_string(),
        ));
    }

    let query_vec = embedder.embed_one(question).await?;
    let hits = index.search(&query_vec, k);

    let context_block = hits
        .iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = build_prompt(transcript_context, &context_block, question);
    generator.generate(&prompt).await
}

/// Assemble the language-model prompt from its three parts.
///
/// Retrieved chunks appear in similarity order; prior conversation
/// context is included only when present and non-empty.
pub fn build_prompt(prior_context: Option<&str>, context_block: &str, question: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Use the following context from the uploaded documents to answer the question.\n\n",
    );
    prompt.push_str("Context:\n");
    prompt.push_str(context_block);
    prompt.push_str("\n\n");

    if let Some(prior) = prior_context {
        if !prior.is_empty() {
            prompt.push_str("Conversation so far:\n");
            prompt.push_str(prior);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt.push_str("\nAnswer:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_context_and_question() {
        let prompt = build_prompt(None, "chunk one\n\nchunk two", "what happened?");
        assert!(prompt.contains("chunk one"));
        assert!(prompt.contains("chunk two"));
        assert!(prompt.contains("Question: what happened?"));
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn prompt_includes_prior_context_when_present() {
        let prompt = build_prompt(Some("User: hi\nAssistant: hello"), "chunk", "next?");
        assert!(prompt.contains("Conversation so far:"));
        assert!(prompt.contains("User: hi"));
    }

    #[test]
    fn empty_prior_context_is_omitted() {
        let prompt = build_prompt(Some(""), "chunk", "q");
        assert!(!prompt.contains("Conversation so far"));
    }
}
