//! # Compliance Checkmate CLI (`ccm`)
//!
//! The `ccm` binary drives the full matching pipeline: database
//! initialization, document ingestion, semantic matching against the
//! regulation catalog, and reporting over persisted results.
//!
//! ## Usage
//!
//! ```bash
//! ccm --config ./config/ccm.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ccm init` | Create the SQLite database and run schema migrations |
//! | `ccm ingest <paths>...` | Extract text from control documents and store them |
//! | `ccm match` | Score stored controls against the regulation catalog |
//! | `ccm documents` | List a company's stored documents |
//! | `ccm results <id>` | Show persisted matches for one document |
//! | `ccm gaps` | List matches below the gap threshold |
//! | `ccm catalog show` | Print the loaded regulation catalog |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! ccm init --config ./config/ccm.toml
//!
//! # Ingest a directory of policies for one company
//! ccm ingest ./policies --company "Acme Corp" --branch "Berlin"
//!
//! # Score everything and persist the matches
//! ccm match --company "Acme Corp"
//!
//! # Weak-coverage report
//! ccm gaps --threshold 0.4
//! ```

mod catalog;
mod config;
mod db;
mod embedding;
mod extract;
mod ingest;
mod match_cmd;
mod matcher;
mod migrate;
mod models;
mod report;
mod results;
mod scorer;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compliance Checkmate — score internal control documents against
/// regulatory clauses with sentence embeddings.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ccm.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ccm",
    about = "Compliance Checkmate — a batch compliance-document matcher",
    version,
    long_about = "Compliance Checkmate ingests internal control documents (PDF/DOCX/TXT), \
    scores them semantically against a catalog of regulatory clauses, persists the ranked \
    matches, and reports coverage gaps."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ccm.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents and match_results
    /// tables. This command is idempotent — running it multiple times is safe.
    Init,

    /// Ingest control documents.
    ///
    /// Extracts text from the given files (or every PDF/DOCX/TXT under the
    /// given directories), skips documents with no extractable text, and
    /// stores the rest. Failures abort the affected document only.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Company the documents belong to.
        #[arg(long)]
        company: String,

        /// Branch or location; defaults to Headquarters.
        #[arg(long)]
        branch: Option<String>,

        /// Show which files would be ingested without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Match stored control texts against the regulation catalog.
    ///
    /// Loads the catalog (seeding a default one if absent), embeds every
    /// clause once, scores each stored control text, prints the ranked
    /// matches, and persists them.
    Match {
        /// Only match documents belonging to this company.
        #[arg(long)]
        company: Option<String>,

        /// Score and print without persisting results.
        #[arg(long)]
        dry_run: bool,

        /// Emit the match sets as JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },

    /// List a company's stored documents, newest first.
    Documents {
        /// Company to list documents for.
        #[arg(long)]
        company: String,

        /// Exact-match filter on branch.
        #[arg(long)]
        branch: Option<String>,
    },

    /// Show persisted matches for one document.
    Results {
        /// Document id.
        id: i64,
    },

    /// List matches scoring below the gap threshold.
    Gaps {
        /// Override the configured gap threshold.
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Inspect the regulation catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
enum CatalogAction {
    /// Print every regulation and clause in the catalog.
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            paths,
            company,
            branch,
            dry_run,
        } => {
            ingest::run_ingest(&cfg, &paths, &company, branch, dry_run).await?;
        }
        Commands::Match {
            company,
            dry_run,
            json,
        } => {
            match_cmd::run_match(&cfg, company, dry_run, json).await?;
        }
        Commands::Documents { company, branch } => {
            report::run_documents(&cfg, &company, branch).await?;
        }
        Commands::Results { id } => {
            report::run_results(&cfg, id).await?;
        }
        Commands::Gaps { threshold } => {
            report::run_gaps(&cfg, threshold).await?;
        }
        Commands::Catalog { action } => match action {
            CatalogAction::Show => {
                report::run_catalog_show(&cfg).await?;
            }
        },
    }

    Ok(())
}
