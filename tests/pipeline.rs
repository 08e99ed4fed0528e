//! End-to-end pipeline tests against deterministic fake adapters.
//!
//! The embedding and generation backends are faked so tests are offline
//! and reproducible: the fake embedder scores texts by topic keyword
//! counts, and the fake generator echoes its prompt so assertions can see
//! exactly what context reached the model.

use async_trait::async_trait;

use docchat::config::Config;
use docchat::embedding::Embedder;
use docchat::error::PipelineError;
use docchat::extract::{DocumentInput, FormatExtractor};
use docchat::generate::Generator;
use docchat::pipeline;
use docchat::transcript::{Speaker, Transcript};

const TOPICS: [&str; 3] = ["rust", "python", "kubernetes"];

/// Maps each text to a 3-d vector of topic keyword counts.
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-fake"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                TOPICS
                    .iter()
                    .map(|topic| lower.matches(topic).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Always fails, simulating an embedding backend outage.
struct UnavailableEmbedder;

#[async_trait]
impl Embedder for UnavailableEmbedder {
    fn model_name(&self) -> &str {
        "unavailable"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Err(PipelineError::EmbeddingUnavailable(
            "backend offline".to_string(),
        ))
    }
}

/// Echoes the prompt back so tests can inspect what the model saw.
struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn model_name(&self) -> &str {
        "echo-fake"
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        Ok(format!("echo:{}", prompt))
    }
}

/// Always fails, simulating a generation backend outage.
struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
        Err(PipelineError::Generation("model timed out".to_string()))
    }
}

fn test_config() -> Config {
    let toml_str = r#"
        [chunking]
        chunk_size = 60
        chunk_overlap = 10
    "#;
    toml::from_str(toml_str).unwrap()
}

fn txt(name: &str, body: &str) -> DocumentInput {
    DocumentInput::new(name, body.as_bytes().to_vec())
}

fn topic_documents() -> Vec<DocumentInput> {
    vec![
        txt(
            "langs.txt",
            "rust is a systems programming language\npython is used for scripting and data\n",
        ),
        txt(
            "infra.txt",
            "kubernetes orchestrates containers across a cluster\n",
        ),
    ]
}

#[tokio::test]
async fn process_builds_index_with_preview_and_chunk_count() {
    let outcome = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &topic_documents(),
        &test_config(),
    )
    .await
    .unwrap();

    assert!(outcome.preview.starts_with("rust is a systems"));
    assert!(outcome.chunk_count >= 2);
    assert_eq!(outcome.chunk_count, outcome.index.len());
    assert!(outcome.skipped.is_empty());
}

#[tokio::test]
async fn preview_is_capped_at_500_characters() {
    let long_body = "word ".repeat(300);
    let outcome = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &[txt("long.txt", &long_body)],
        &test_config(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.preview.chars().count(), 500);
    assert_eq!(outcome.preview, long_body.chars().take(500).collect::<String>());
}

#[tokio::test]
async fn corrupt_document_is_skipped_and_batch_continues() {
    let docs = vec![
        txt("good.txt", "rust is a systems programming language\n"),
        DocumentInput::new("bad.pdf", b"definitely not a pdf".to_vec()),
    ];
    let outcome = pipeline::process(&FormatExtractor, &KeywordEmbedder, &docs, &test_config())
        .await
        .unwrap();

    assert!(outcome.preview.contains("rust"));
    assert!(!outcome.preview.contains("not a pdf"));
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].name, "bad.pdf");
}

#[tokio::test]
async fn no_documents_is_an_empty_corpus() {
    let err = pipeline::process(&FormatExtractor, &KeywordEmbedder, &[], &test_config())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCorpus));
}

#[tokio::test]
async fn all_documents_unreadable_is_an_empty_corpus() {
    let docs = vec![
        DocumentInput::new("a.pdf", b"junk".to_vec()),
        DocumentInput::new("b.docx", b"junk".to_vec()),
    ];
    let err = pipeline::process(&FormatExtractor, &KeywordEmbedder, &docs, &test_config())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCorpus));
}

#[tokio::test]
async fn embedding_outage_propagates_unchanged() {
    let err = pipeline::process(
        &FormatExtractor,
        &UnavailableEmbedder,
        &topic_documents(),
        &test_config(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::EmbeddingUnavailable(_)));
}

#[tokio::test]
async fn question_before_processing_fails_with_retrieval_error() {
    let err = pipeline::answer(&KeywordEmbedder, &EchoGenerator, None, "anything?", 4, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Retrieval(_)));
}

#[tokio::test]
async fn answer_grounds_the_prompt_in_the_most_similar_chunk() {
    let outcome = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &topic_documents(),
        &test_config(),
    )
    .await
    .unwrap();

    let response = pipeline::answer(
        &KeywordEmbedder,
        &EchoGenerator,
        Some(&outcome.index),
        "tell me about kubernetes",
        1,
        None,
    )
    .await
    .unwrap();

    assert!(response.contains("orchestrates containers"));
    assert!(!response.contains("systems programming"));
    assert!(response.contains("Question: tell me about kubernetes"));
}

#[tokio::test]
async fn answer_injects_transcript_context() {
    let outcome = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &topic_documents(),
        &test_config(),
    )
    .await
    .unwrap();

    let transcript = Transcript::new()
        .append_turn(Speaker::User, "what is rust?")
        .append_turn(Speaker::Assistant, "a systems language");
    let context = transcript.render();

    let response = pipeline::answer(
        &KeywordEmbedder,
        &EchoGenerator,
        Some(&outcome.index),
        "and python?",
        2,
        Some(&context),
    )
    .await
    .unwrap();

    assert!(response.contains("Conversation so far:"));
    assert!(response.contains("User: what is rust?"));
}

#[tokio::test]
async fn generation_outage_propagates_unchanged() {
    let outcome = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &topic_documents(),
        &test_config(),
    )
    .await
    .unwrap();

    let err = pipeline::answer(
        &KeywordEmbedder,
        &FailingGenerator,
        Some(&outcome.index),
        "rust?",
        2,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));
}

#[tokio::test]
async fn k_larger_than_corpus_uses_the_whole_corpus() {
    let outcome = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &topic_documents(),
        &test_config(),
    )
    .await
    .unwrap();

    let hits = outcome.index.search(&[1.0, 0.0, 0.0], 1000);
    assert_eq!(hits.len(), outcome.index.len());
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn reprocessing_a_disjoint_corpus_leaves_no_leakage() {
    let cfg = test_config();
    let first = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &[txt("a.txt", "rust rust rust\n")],
        &cfg,
    )
    .await
    .unwrap();

    let second = pipeline::process(
        &FormatExtractor,
        &KeywordEmbedder,
        &[txt("b.txt", "kubernetes kubernetes\n")],
        &cfg,
    )
    .await
    .unwrap();

    assert_ne!(first.index.corpus_id(), second.index.corpus_id());
    for entry in second.index.entries() {
        assert!(!entry.text.contains("rust"));
    }
}
