//! # Problem DB CLI (`problem-db`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `problem-db init` | Create the SQLite database and schema |
//! | `problem-db import` | Load the problem dump and upsert every problem |
//! | `problem-db search "<query>"` | Search problem titles |
//! | `problem-db stats` | Show counts and database size |
//!
//! ## Examples
//!
//! ```bash
//! # Import a local dump into ./problems.db
//! problem-db import --json ./merged_problems.json
//!
//! # Download the upstream dump into a specific database
//! problem-db import --download --db ./data/problems.db
//!
//! # Prefix search on titles
//! problem-db search "two su"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use problem_db::config;
use problem_db::ingest::{self, DumpSource};
use problem_db::migrate;
use problem_db::progress::ProgressMode;
use problem_db::search;
use problem_db::stats;
use problem_db::telemetry;

/// Import a JSON dump of coding problems into SQLite with a title search index.
#[derive(Parser)]
#[command(name = "problem-db", version)]
struct Cli {
    /// Path to configuration file (TOML). Defaults are used if it does not exist.
    #[arg(long, global = true, default_value = "./config/problem-db.toml")]
    config: PathBuf,

    /// Path to the SQLite database. Overrides `[db].path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema. Safe to run repeatedly.
    Init,

    /// Import problems from a local JSON file or the upstream URL.
    ///
    /// Existing problems are updated in place (keyed by source and slug),
    /// their topics are replaced, and the title index is rebuilt at the end.
    Import {
        /// Local JSON dump. Overrides `[import].json_path`.
        #[arg(long, conflicts_with = "download")]
        json: Option<PathBuf>,

        /// Download the dump instead of reading a local file.
        #[arg(long)]
        download: bool,

        /// URL used with `--download`. Overrides `[import].url`.
        #[arg(long, requires = "download")]
        url: Option<String>,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Search problem titles.
    Search {
        /// Words to match; the last one may be a prefix.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show problem, topic and link counts and the database size.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let mut cfg = config::load_config(&cli.config)?;
    if let Some(db) = cli.db {
        cfg.db.path = db;
    }

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            json,
            download,
            url,
            progress,
        } => {
            let source = if download {
                DumpSource::Url(url.unwrap_or_else(|| cfg.import.url.clone()))
            } else {
                DumpSource::File(json.unwrap_or_else(|| cfg.import.json_path.clone()))
            };
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();

            let summary = ingest::run_import(&cfg, &source, reporter.as_ref()).await?;
            stats::print_import_summary(&summary);
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
