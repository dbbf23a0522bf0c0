//! # Norma CLI (`norma`)
//!
//! Command-line interface for the standards assistant.
//!
//! ## Usage
//!
//! ```bash
//! norma --config ./config/norma.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `norma index` | Build the vector index from a PDF directory (or load the persisted one) |
//! | `norma ask "<question>"` | Answer a single question against the index |
//! | `norma chat` | Start an interactive chat session |
//!
//! ## Examples
//!
//! ```bash
//! # Index a directory of standards
//! norma index --dir ./standards
//!
//! # Force a rebuild (also the recovery path for a corrupt artifact)
//! norma index --dir ./standards --force
//!
//! # One-shot question
//! norma ask "What is the minimum wall thickness?"
//!
//! # Interactive session
//! norma chat
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use norma::{chat, config, index};

/// Norma — a retrieval-augmented question answering assistant for PDF
/// technical standards.
#[derive(Parser)]
#[command(
    name = "norma",
    about = "Norma — retrieval-augmented question answering over PDF technical standards",
    version,
    long_about = "Norma ingests a directory of standards PDFs, builds a persisted \
    similarity index over embedded text chunks, and answers questions by retrieving \
    the most relevant passages and forwarding them to a chat model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/norma.toml`. A missing file means built-in
    /// defaults; CLI flags override either.
    #[arg(long, global = true, default_value = "./config/norma.toml")]
    config: PathBuf,

    /// Directory of PDF standards (overrides `corpus.directory`).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Location of the persisted index (overrides `corpus.index_path`).
    #[arg(long, global = true)]
    index_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the vector index, or load it when already persisted.
    ///
    /// A persisted index is trusted verbatim — source PDFs are not
    /// re-checked against it. Use `--force` to re-ingest from scratch.
    Index {
        /// Delete any existing index artifact and rebuild.
        #[arg(long)]
        force: bool,
    },

    /// Answer a single question against the indexed standards.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Start an interactive chat session.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("norma=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load_or_default(&cli.config)?;
    if let Some(dir) = cli.dir {
        cfg.corpus.directory = dir;
    }
    if let Some(index_path) = cli.index_path {
        cfg.corpus.index_path = index_path;
    }

    match cli.command {
        Commands::Index { force } => {
            index::run_index(&cfg, force).await?;
        }
        Commands::Ask { question } => {
            chat::run_ask(&cfg, &question).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
    }

    Ok(())
}
