//! # Repo Scribe CLI (`scribe`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scribe clone` | Clone the configured repositories with submodules |
//! | `scribe sources` | List configured repositories and whether they are cloned |
//! | `scribe register [root]` | Insert a pending record for every new file |
//! | `scribe backfill` | Explain and embed records that have no explanation |
//! | `scribe sync [root]` | `register`, then `backfill` |
//! | `scribe search "<query>"` | Show the closest catalog records |
//! | `scribe ask "<query>"` | Answer a question from the closest files |
//! | `scribe stats` | Registered / explained / pending counts |
//!
//! Credentials are read from the environment (and a `.env` file in the
//! working directory): `SUPABASE_URL`, `SUPABASE_KEY`, `SUPABASE_ORG_ID`,
//! `OPENAI_API_KEY`. Diagnostics go to stderr; set `RUST_LOG` to adjust.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use repo_scribe::config::{self, Config, Credentials};
use repo_scribe::services::{store_client, Clients};
use repo_scribe::{backfill, connector_git, ingest, search, sources, stats};

/// Repo Scribe: explain cloned repositories with a language model and
/// answer questions about them.
#[derive(Parser)]
#[command(name = "scribe", version)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply without one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone every configured repository (existing checkouts are skipped).
    Clone,

    /// List configured repositories and their checkout status.
    Sources,

    /// Register files under ROOT that are not in the catalog yet.
    Register {
        /// Directory to scan. Defaults to `[ingest].root`.
        root: Option<PathBuf>,
    },

    /// Explain and embed every record whose explanation is null.
    Backfill {
        /// Process at most this many records.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Register new files, then backfill.
    Sync {
        /// Directory to scan. Defaults to `[ingest].root`.
        root: Option<PathBuf>,
    },

    /// Print the catalog records closest to QUERY.
    Search {
        query: String,
    },

    /// Answer QUERY using the closest files as context.
    Ask {
        query: String,
    },

    /// Show catalog progress.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn scan_root(config: &Config, root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| config.ingest.root.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = config::load_config(cli.config.as_deref())?;
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Clone => {
            connector_git::run_clone(&cfg.clone)?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg.clone)?;
        }
        Commands::Stats => {
            let store = store_client(&cfg, &credentials)?;
            stats::run_stats(&store).await?;
        }
        Commands::Register { root } => {
            let root = scan_root(&cfg, root);
            let store = store_client(&cfg, &credentials)?;
            ingest::run_register(&store, &root, &cfg.ingest.exclude_globs).await?;
        }
        Commands::Backfill { limit } => {
            let clients = Clients::connect(&cfg, &credentials)?;
            backfill::run_backfill(clients.services(&cfg), limit).await?;
        }
        Commands::Sync { root } => {
            let root = scan_root(&cfg, root);
            let clients = Clients::connect(&cfg, &credentials)?;
            ingest::run_sync(clients.services(&cfg), &root).await?;
        }
        Commands::Search { query } => {
            let clients = Clients::connect(&cfg, &credentials)?;
            search::run_search(clients.services(&cfg), &query).await?;
        }
        Commands::Ask { query } => {
            let clients = Clients::connect(&cfg, &credentials)?;
            search::run_ask(clients.services(&cfg), &query).await?;
        }
    }

    Ok(())
}
