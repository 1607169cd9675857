//! # Flow Catalog CLI (`flowcat`)
//!
//! The `flowcat` binary is the primary interface for Flow Catalog. It
//! provides commands for indexing a corpus of workflow JSON files, searching
//! the catalog, inspecting individual workflows, deriving install plans, and
//! starting the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! flowcat --config ./config/flowcat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `flowcat index` | Build the catalog and report corpus coverage |
//! | `flowcat search "<query>"` | Ranked keyword search over indexed workflows |
//! | `flowcat show <id>` | Print one workflow's metadata and install plan |
//! | `flowcat plan <id>` | Print a workflow's install plan |
//! | `flowcat raw <id>` | Print the raw JSON definition from disk |
//! | `flowcat stats` | Print corpus statistics |
//! | `flowcat id encode <path>` | Encode a relative path into a workflow id |
//! | `flowcat id decode <id>` | Decode a workflow id back into its path |
//! | `flowcat serve http` | Start the JSON HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Index the corpus and report skipped files
//! flowcat index --config ./config/flowcat.toml
//!
//! # Keyword search, filtered to a tag
//! flowcat search "slack notification" --tag slack --limit 5
//!
//! # Inspect one workflow and its install plan
//! flowcat show dGVhbS9zbGFjay5qc29u
//!
//! # Start the HTTP API
//! flowcat serve http --config ./config/flowcat.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use flow_catalog::{catalog, config, get, ids, plan, search, server, stats};

/// Flow Catalog CLI for indexing and searching a directory of automation
/// workflow JSON files.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/flowcat.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "flowcat",
    about = "Index, search, and plan installs for a corpus of n8n workflow files",
    version,
    long_about = "Flow Catalog scans a directory tree of n8n-style workflow JSON files, \
    extracts metadata (name, integration tags, credentials, complexity), and answers ranked \
    keyword queries via a CLI and a JSON HTTP API. Install plans are derived on demand from \
    the indexed metadata."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/flowcat.toml`. The corpus root, crawl globs,
    /// build limits, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/flowcat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the workflow catalog and report corpus coverage.
    ///
    /// Crawls the corpus root, parses every matching JSON file in parallel,
    /// and prints how many workflows were indexed and which files were
    /// skipped (with reasons). Skipped files never abort the build.
    Index,

    /// Search indexed workflows.
    ///
    /// Ranks by lexical overlap against names, tags, descriptions, and
    /// search tokens, adjusted by install-effort heuristics. An empty query
    /// lists everything in crawl order.
    Search {
        /// The search query string. May be empty.
        query: String,

        /// Require a tag (repeatable). Case-insensitive substring match
        /// against each workflow's tags.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Maximum number of results. Defaults to `[search].default_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print one workflow's metadata and derived install plan.
    Show {
        /// Workflow id (as printed by `index` and `search`).
        id: String,
    },

    /// Print a workflow's install plan.
    ///
    /// The plan is recomputed from the indexed metadata: credential
    /// checklist, install steps, test steps, and risk notes.
    Plan {
        /// Workflow id.
        id: String,
    },

    /// Print the raw JSON definition exactly as stored on disk.
    Raw {
        /// Workflow id.
        id: String,
    },

    /// Print corpus statistics.
    ///
    /// Workflow and node counts, complexity breakdown, top tags, credential
    /// usage, and any files the build skipped.
    Stats,

    /// Workflow id utilities.
    ///
    /// Ids are a reversible encoding of the corpus-relative path, safe to
    /// put in URLs. These helpers convert in both directions.
    Id {
        #[command(subcommand)]
        action: IdAction,
    },

    /// Start the HTTP API server.
    ///
    /// Exposes the catalog as a JSON API for browser UIs and other services.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Id conversion subcommands.
#[derive(Subcommand)]
enum IdAction {
    /// Encode a corpus-relative path into an opaque workflow id.
    Encode {
        /// Relative path, e.g. `team/slack-notifier.json`.
        path: String,
    },
    /// Decode a workflow id back into its corpus-relative path.
    Decode {
        /// Workflow id.
        id: String,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the JSON HTTP API.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// catalog endpoints until terminated.
    Http,
}

/// Initialize tracing with an env-filter; `RUST_LOG` overrides the default.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Quiet for one-shot commands, chattier when serving.
    let default_level = match &cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    // Commands that don't require config
    match &cli.command {
        Commands::Id {
            action: IdAction::Encode { path },
        } => {
            println!("{}", ids::encode_workflow_id(path));
            return Ok(());
        }
        Commands::Id {
            action: IdAction::Decode { id },
        } => {
            println!("{}", ids::decode_workflow_id(id)?);
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index => {
            catalog::run_index(&cfg).await?;
        }
        Commands::Search { query, tags, limit } => {
            search::run_search(&cfg, &query, tags, limit).await?;
        }
        Commands::Show { id } => {
            get::run_show(&cfg, &id).await?;
        }
        Commands::Plan { id } => {
            plan::run_plan(&cfg, &id).await?;
        }
        Commands::Raw { id } => {
            get::run_raw(&cfg, &id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Http => {
                server::run_server(&cfg).await?;
            }
        },
        Commands::Id { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
