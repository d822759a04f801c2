//! # Navi CLI (`navi`)
//!
//! The `navi` binary initializes the knowledge database, loads corpora,
//! answers questions from the terminal, and runs the chat server.
//!
//! ## Usage
//!
//! ```bash
//! navi --config ./config/navi.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `navi init` | Create the SQLite database and schema |
//! | `navi seed <file.json>` | Embed and load a knowledge corpus |
//! | `navi ask "<message>"` | Answer one question |
//! | `navi search "<query>"` | Show ranked matches without generating |
//! | `navi stats` | Entry counts per category |
//! | `navi serve` | Start the chat HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Load the campus corpus
//! navi seed ./data/campus-data.json --config ./config/navi.toml
//!
//! # Ask with an inline category tag
//! navi ask "[Context: College of Engineering] Where is the dean's office?"
//!
//! # Same question with a structured category and diagnostics
//! navi ask "Where is the dean's office?" --category "College of Engineering" --explain
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use navi::{ask, config, logging, migrate, search, seed, server, stats};

/// Navi CLI: category-scoped retrieval-augmented answering for campus
/// knowledge.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/navi.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "navi",
    about = "Navi: category-scoped retrieval-augmented answering for campus knowledge",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/navi.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `knowledge_entries` table.
    /// Running it again is safe.
    Init,

    /// Load a JSON corpus of knowledge items.
    ///
    /// Each item is `{ "id"?, "text", "category"? }`; items without a
    /// category are filed under `General`.
    Seed {
        /// Path to the corpus JSON file.
        file: PathBuf,

        /// Validate the file and show per-category counts without embedding.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer one question and print the reply.
    Ask {
        /// The question, optionally prefixed with `[Context: <category>]`.
        message: String,

        /// Scope the question to this category instead of parsing a tag.
        #[arg(long)]
        category: Option<String>,

        /// Also print the category, matches with scores, and outcome.
        #[arg(long)]
        explain: bool,
    },

    /// Show ranked knowledge matches without generating an answer.
    Search {
        /// The search query, optionally prefixed with `[Context: <category>]`.
        query: String,

        /// Scope the search to this category instead of parsing a tag.
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of results (defaults to `retrieval.match_count`).
        #[arg(long)]
        limit: Option<usize>,

        /// Minimum similarity (defaults to `retrieval.match_threshold`).
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f32>,
    },

    /// Show entry counts per category and embedding dimensionality.
    Stats,

    /// Start the chat HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed { file, dry_run } => {
            seed::run_seed(&cfg, &file, dry_run).await?;
        }
        Commands::Ask {
            message,
            category,
            explain,
        } => {
            ask::run_ask(&cfg, &message, category.as_deref(), explain).await?;
        }
        Commands::Search {
            query,
            category,
            limit,
            threshold,
        } => {
            search::run_search(&cfg, &query, category.as_deref(), limit, threshold).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
