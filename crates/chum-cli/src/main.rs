//! Chum Catalog CLI - Package catalog of the SailfishOS:Chum repository
//!
//! Provides:
//! - Building the catalog from OBS repositories or a local snapshot
//! - Searching, listing and inspecting packages
//! - Exporting the catalog for a search index

mod commands;
mod config;
mod helpers;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_export, cmd_fetch, cmd_list, cmd_search, cmd_show, cmd_stats};
use config::SourceArgs;

#[derive(Parser)]
#[command(name = "chum-catalog")]
#[command(about = "Builds the package catalog of the SailfishOS:Chum repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of threads for parallel processing (default: number of CPU cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetches all repository indexes and reports per-repository results
    Fetch,

    /// Shows catalog statistics
    Stats {
        /// Number of entries to list for packages with problems
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Searches packages by name, title and summary
    Search {
        /// Text to look for (case-insensitive)
        query: String,

        /// Treat the query as a regular expression
        #[arg(short, long)]
        regex: bool,

        /// Maximum number of results to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,

        /// Show all results (no limit)
        #[arg(short, long)]
        all: bool,
    },

    /// Shows the details of one package
    Show {
        /// Package name
        name: String,

        /// Include the raw extension metadata and its parse errors
        #[arg(long)]
        debug: bool,
    },

    /// Lists packages
    List {
        /// Only packages updated since date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Only packages of this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only applications
        #[arg(long)]
        apps: bool,

        /// Include debuginfo and debugsource packages
        #[arg(long)]
        with_debug: bool,
    },

    /// Writes the search index documents as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&cli.log_level)
    ).init();

    // Configure Rayon thread pool if specified
    if let Some(num_threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }
    log::debug!("Using {} threads for parallel processing", rayon::current_num_threads());

    let config = cli.source.to_pipeline_config()?;

    match cli.command {
        Commands::Fetch => {
            cmd_fetch(config)?;
        }
        Commands::Stats { limit } => {
            cmd_stats(config, limit)?;
        }
        Commands::Search { query, regex, limit, all } => {
            cmd_search(config, query, regex, limit, all)?;
        }
        Commands::Show { name, debug } => {
            cmd_show(config, name, debug)?;
        }
        Commands::List { since, category, apps, with_debug } => {
            cmd_list(config, since, category, apps, with_debug)?;
        }
        Commands::Export { output, pretty } => {
            cmd_export(config, output, pretty)?;
        }
    }

    Ok(())
}
