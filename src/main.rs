//! # docchat CLI
//!
//! Thin interactive frontend over the docchat pipeline. The CLI owns all
//! presentation; ingestion, retrieval, and generation live in the library.
//!
//! ## Usage
//!
//! ```bash
//! docchat --config ./docchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat ingest <files…>` | Extract, chunk, and index documents; print a preview |
//! | `docchat ask <files…> --question "<q>"` | Ingest then answer a single question |
//! | `docchat chat <files…>` | Ingest then answer questions interactively |

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use docchat::config::{self, Config};
use docchat::embedding::{create_embedder, Embedder};
use docchat::extract::{DocumentInput, FormatExtractor};
use docchat::generate::create_generator;
use docchat::pipeline::{self, IngestOutcome};
use docchat::transcript::{Speaker, Transcript};

/// docchat — chat with your documents from the command line.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; defaults apply when the file does not exist.
#[derive(Parser)]
#[command(
    name = "docchat",
    about = "Chat with your documents: local ingestion, vector retrieval, and RAG answering",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./docchat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk, embed, and index a document set.
    ///
    /// Prints a preview of the extracted text, the chunk count, and any
    /// documents that were skipped as unreadable.
    Ingest {
        /// Document files to ingest (.pdf, .docx, .txt, .md).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ingest a document set and answer one question.
    Ask {
        /// Document files to ingest.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// The question to answer.
        #[arg(long, short)]
        question: String,

        /// Override the configured number of retrieved chunks.
        #[arg(long, short)]
        k: Option<usize>,
    },

    /// Ingest a document set and answer questions interactively.
    ///
    /// Maintains a conversation transcript across questions and injects
    /// it into each prompt. An empty line or EOF ends the session.
    Chat {
        /// Document files to ingest.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Ingest { files } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let outcome = ingest(embedder.as_ref(), &files, &cfg).await?;
            println!("preview:");
            println!("{}", outcome.preview);
        }
        Commands::Ask { files, question, k } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let generator = create_generator(&cfg.generation)?;
            let outcome = ingest(embedder.as_ref(), &files, &cfg).await?;
            let k = k.unwrap_or(cfg.retrieval.top_k);
            let response = pipeline::answer(
                embedder.as_ref(),
                generator.as_ref(),
                Some(&outcome.index),
                &question,
                k,
                None,
            )
            .await?;
            println!("{}", response);
        }
        Commands::Chat { files } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let generator = create_generator(&cfg.generation)?;
            let outcome = ingest(embedder.as_ref(), &files, &cfg).await?;
            let mut transcript = Transcript::new();

            let stdin = std::io::stdin();
            loop {
                print!("you> ");
                std::io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let question = line.trim();
                if question.is_empty() {
                    break;
                }

                let context = transcript.render_bounded(cfg.transcript.max_context_chars);
                let context = if context.is_empty() {
                    None
                } else {
                    Some(context)
                };
                let response = pipeline::answer(
                    embedder.as_ref(),
                    generator.as_ref(),
                    Some(&outcome.index),
                    question,
                    cfg.retrieval.top_k,
                    context.as_deref(),
                )
                .await?;
                println!("{}", response);

                transcript = transcript
                    .append_turn(Speaker::User, question)
                    .append_turn(Speaker::Assistant, response);
            }
        }
    }

    Ok(())
}

/// Read the document files, run ingestion, and print the summary report.
async fn ingest(
    embedder: &dyn Embedder,
    files: &[PathBuf],
    cfg: &Config,
) -> Result<IngestOutcome> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        documents.push(DocumentInput::from_path(path)?);
    }

    let outcome = pipeline::process(&FormatExtractor, embedder, &documents, cfg).await?;

    println!("ingest");
    println!("  documents: {}", documents.len());
    println!("  chunks: {}", outcome.chunk_count);
    if !outcome.skipped.is_empty() {
        println!("  skipped: {}", outcome.skipped.len());
        for skip in &outcome.skipped {
            eprintln!("warning: skipped '{}': {}", skip.name, skip.reason);
        }
    }
    println!("ok");

    Ok(outcome)
}
