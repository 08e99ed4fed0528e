//! Immutable in-memory vector index.
//!
//! Stores `(chunk text, embedding vector)` pairs in insertion order and
//! answers nearest-neighbor queries by brute-force scoring over all
//! entries. Built once per processed document set; a re-process builds a
//! fresh index and the caller swaps the reference, so an in-flight search
//! always sees one consistent corpus. There is no mutation-in-place and
//! no merge of old and new corpora.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::embedding::{cosine_similarity, euclidean_distance};
use crate::error::PipelineError;

/// Similarity metric used to rank index entries against a query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMetric {
    /// Cosine of the angle between vectors (default).
    Cosine,
    /// Negated Euclidean distance, so that larger is always closer.
    Euclidean,
}

impl SimilarityMetric {
    /// Parse a config value (`"cosine"` or `"euclidean"`).
    pub fn parse(name: &str) -> Result<Self, PipelineError> {
        match name {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "euclidean" => Ok(SimilarityMetric::Euclidean),
            other => Err(PipelineError::Configuration(format!(
                "unknown similarity metric: '{}'",
                other
            ))),
        }
    }

    /// Score `candidate` against `query`; higher means more similar.
    pub fn score(&self, query: &[f32], candidate: &[f32]) -> f32 {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(query, candidate),
            SimilarityMetric::Euclidean => -euclidean_distance(query, candidate),
        }
    }
}

/// One chunk paired with its embedding vector.
///
/// Created at index-build time and never mutated. The hash is a SHA-256
/// digest of the chunk text, kept for traceability across rebuilds.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Unique id of this entry, minted at build time.
    pub id: String,
    /// Position of the chunk in the original split, starting at 0.
    pub chunk_index: usize,
    pub text: String,
    pub hash: String,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk_index: usize, text: String, vector: Vec<f32>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        Self {
            id: Uuid::new_v4().to_string(),
            chunk_index,
            text,
            hash,
            vector,
        }
    }
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

/// Immutable nearest-neighbor index over embedded chunks.
#[derive(Debug)]
pub struct VectorIndex {
    corpus_id: String,
    metric: SimilarityMetric,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Construct an index over `entries`.
    ///
    /// # Errors
    ///
    /// `PipelineError::EmptyCorpus` when `entries` is empty: a question
    /// cannot be answered with zero context, so the caller must refuse
    /// before ever reaching the query engine.
    pub fn build(
        entries: Vec<IndexEntry>,
        metric: SimilarityMetric,
    ) -> Result<Self, PipelineError> {
        if entries.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        Ok(Self {
            corpus_id: Uuid::new_v4().to_string(),
            metric,
            entries,
        })
    }

    /// Unique id of this corpus build; a rebuild always gets a new one.
    pub fn corpus_id(&self) -> &str {
        &self.corpus_id
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: `build` rejects empty corpora.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Return the `k` entries most similar to `query`, ordered by
    /// decreasing similarity. Ties keep insertion order (stable sort), so
    /// results are deterministic. `k` larger than the corpus returns the
    /// whole corpus.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk_index: entry.chunk_index,
                text: entry.text.clone(),
                score: self.metric.score(query, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: usize, text: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry::new(i, text.to_string(), vector)
    }

    fn small_index(metric: SimilarityMetric) -> VectorIndex {
        VectorIndex::build(
            vec![
                entry(0, "east", vec![1.0, 0.0]),
                entry(1, "north", vec![0.0, 1.0]),
                entry(2, "north-east", vec![1.0, 1.0]),
            ],
            metric,
        )
        .unwrap()
    }

    #[test]
    fn build_empty_fails_with_empty_corpus() {
        let err = VectorIndex::build(vec![], SimilarityMetric::Cosine).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCorpus));
    }

    #[test]
    fn search_orders_by_decreasing_similarity() {
        let index = small_index(SimilarityMetric::Cosine);
        let hits = index.search(&[1.0, 0.1], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "east");
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[test]
    fn search_k_larger_than_corpus_returns_everything() {
        let index = small_index(SimilarityMetric::Cosine);
        let hits = index.search(&[0.0, 1.0], 100);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "north");
    }

    #[test]
    fn search_truncates_to_k() {
        let index = small_index(SimilarityMetric::Cosine);
        let hits = index.search(&[1.0, 1.0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "north-east");
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let index = VectorIndex::build(
            vec![
                entry(0, "first", vec![1.0, 0.0]),
                entry(1, "twin-a", vec![0.0, 1.0]),
                entry(2, "twin-b", vec![0.0, 1.0]),
            ],
            SimilarityMetric::Cosine,
        )
        .unwrap();
        let hits = index.search(&[0.0, 1.0], 2);
        assert_eq!(hits[0].text, "twin-a");
        assert_eq!(hits[1].text, "twin-b");
    }

    #[test]
    fn euclidean_metric_ranks_nearest_first() {
        let index = VectorIndex::build(
            vec![
                entry(0, "far", vec![10.0, 10.0]),
                entry(1, "near", vec![1.0, 1.0]),
            ],
            SimilarityMetric::Euclidean,
        )
        .unwrap();
        let hits = index.search(&[0.0, 0.0], 2);
        assert_eq!(hits[0].text, "near");
        assert_eq!(hits[1].text, "far");
    }

    #[test]
    fn rebuild_gets_a_fresh_corpus_id() {
        let a = small_index(SimilarityMetric::Cosine);
        let b = small_index(SimilarityMetric::Cosine);
        assert_ne!(a.corpus_id(), b.corpus_id());
    }

    #[test]
    fn entries_keep_insertion_order_and_hashes() {
        let index = small_index(SimilarityMetric::Cosine);
        let indices: Vec<usize> = index.entries().iter().map(|e| e.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        for e in index.entries() {
            assert_eq!(e.hash.len(), 64);
            assert!(!e.id.is_empty());
        }
        assert_ne!(index.entries()[0].id, index.entries()[1].id);
    }

    #[test]
    fn metric_parse_accepts_known_names() {
        assert_eq!(
            SimilarityMetric::parse("cosine").unwrap(),
            SimilarityMetric::Cosine
        );
        assert_eq!(
            SimilarityMetric::parse("euclidean").unwrap(),
            SimilarityMetric::Euclidean
        );
        assert!(SimilarityMetric::parse("dot").is_err());
    }
}
