//! # spec-rag
//!
//! Contextual retrieval over OpenAPI specifications.
//!
//! ```bash
//! # Chunk, contextualize, embed and upsert specs (wipe the collection first)
//! spec-rag ingest specs/ats.json https://api.eu1.stackone.com/oas/hris.json --reset
//!
//! # Ask a question
//! spec-rag ask "How do I create a candidate?"
//!
//! # Score retrieval against the labeled dataset
//! spec-rag evaluate data/test_queries.json --k 1,3,5,10 --out report.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;

#[derive(Parser)]
#[command(name = "spec-rag")]
#[command(about = "Contextual RAG over OpenAPI specifications", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise workspace crates to debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk and upsert OpenAPI JSON documents from files or http(s) URLs
    Ingest {
        /// Spec files or URLs; the file stem becomes the chunk-id prefix
        #[arg(value_name = "SOURCES", required = true)]
        sources: Vec<String>,
        /// Delete the collection before ingesting
        #[arg(long)]
        reset: bool,
        /// Skip LLM context prefixes
        #[arg(long)]
        no_context: bool,
    },
    /// Retrieve context for a question and answer it
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,
        /// Number of nearest chunks (defaults to RAG_TOP_K)
        #[arg(long, short = 'k')]
        k: Option<usize>,
        /// Maximum distance (defaults to RAG_DISTANCE_THRESHOLD)
        #[arg(long)]
        threshold: Option<f32>,
        /// Show retrieved chunks only
        #[arg(long)]
        no_llm: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Multi-turn conversation on stdin; follow-ups are rewritten before retrieval
    Chat {
        #[arg(long, short = 'k')]
        k: Option<usize>,
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Evaluate retrieval against labeled test queries
    Evaluate {
        #[arg(value_name = "DATASET", default_value = "data/test_queries.json")]
        dataset: PathBuf,
        /// Comma-separated cutoffs (defaults to EVAL_K_VALUES)
        #[arg(long, value_name = "K_VALUES")]
        k: Option<String>,
        /// Maximum distance (defaults to RAG_DISTANCE_THRESHOLD)
        #[arg(long)]
        threshold: Option<f32>,
        /// Write the full JSON report here
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    ai_llm_service::telemetry::init("warn", level);

    match cli.command {
        Commands::Ingest {
            sources,
            reset,
            no_context,
        } => commands::ingest(&sources, reset, no_context).await,
        Commands::Ask {
            question,
            k,
            threshold,
            no_llm,
            json,
        } => commands::ask(&question, k, threshold, no_llm, json).await,
        Commands::Chat { k, threshold } => commands::chat(k, threshold).await,
        Commands::Evaluate {
            dataset,
            k,
            threshold,
            out,
        } => commands::evaluate(&dataset, k.as_deref(), threshold, out.as_deref()).await,
    }
}
