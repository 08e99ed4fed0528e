//! # docchat
//!
//! Chat with your documents: a local ingestion and retrieval-augmented
//! answering pipeline.
//!
//! docchat extracts text from uploaded documents (PDF, DOCX, plain text),
//! splits it into overlapping chunks, embeds each chunk through an
//! external embedding backend, indexes the vectors in memory, and answers
//! natural-language questions by retrieving the most similar chunks and
//! conditioning a language model on them. A conversational transcript can
//! be threaded through successive questions.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌──────────┐   ┌─────────────┐
//! │ Extractor │──▶│ Chunker │──▶│ Embedder │──▶│ VectorIndex │
//! │ PDF/DOCX  │   │ overlap │   │ adapter  │   │ (in-memory) │
//! └───────────┘   └─────────┘   └──────────┘   └──────┬──────┘
//!                                                     │ top-k
//!                 ┌────────────┐   ┌───────────┐      ▼
//!    question ───▶│ Transcript │──▶│ Generator │◀── prompt
//!                 │ (optional) │   │ adapter   │──▶ answer
//!                 └────────────┘   └───────────┘
//! ```
//!
//! The index is built once per document set and replaced wholesale on
//! re-ingestion; queries run against an immutable snapshot. Embedding and
//! generation are opaque adapter traits so the pipeline can be exercised
//! against deterministic fakes.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Pipeline error taxonomy |
//! | [`extract`] | Per-document text extraction |
//! | [`chunk`] | Overlapping sliding-window chunker |
//! | [`embedding`] | Embedding adapter trait and backends |
//! | [`generate`] | Language-model adapter trait and backends |
//! | [`index`] | Immutable in-memory vector index |
//! | [`transcript`] | Conversation history |
//! | [`pipeline`] | Ingestion and answering orchestration |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod pipeline;
pub mod transcript;
