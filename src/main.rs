//! docharvest main entry point
//!
//! This is the command-line interface for the documentation harvester.

use anyhow::Context;
use clap::{Parser, Subcommand};
use docharvest::config::{resolve_config, Config};
use docharvest::convert::{ChatCompletionsConverter, Converter};
use docharvest::output::{
    print_index_outcome, print_local_docsets, print_pull_outcome, print_push_report,
    print_remote_docsets,
};
use docharvest::sync::{DocsetManager, IndexRequest, DEFAULT_LIST_LIMIT};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// docharvest: documentation harvester
///
/// Crawls a documentation site, converts its pages to Markdown and keeps
/// the result in a local cache that can be shared through a remote backend.
#[derive(Parser, Debug)]
#[command(name = "docharvest")]
#[command(version)]
#[command(about = "Crawl documentation sites into a local Markdown cache", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a documentation site (served from cache when possible)
    Index {
        /// Docset name
        name: String,
        /// Base URL of the site
        url: String,
        /// Only crawl pages under this path (inferred when omitted)
        prefix: Option<String>,
        /// Ignore cached copies and crawl again
        #[arg(long)]
        force: bool,
    },

    /// List docsets in the local cache
    List,

    /// List docsets on the shared backend
    ListRemote {
        /// Free-text search
        query: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Install a docset by id or name, preferring the newest copy
    Pull {
        /// Docset id or name
        identifier: String,
    },

    /// Upload every local docset to the shared backend
    Push,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docharvest=info,warn"),
            1 => EnvFilter::new("docharvest=debug,info"),
            2 => EnvFilter::new("docharvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs one command; `Ok(false)` means it completed without a usable result
async fn run(cli: Cli) -> anyhow::Result<bool> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let config = resolve_config(cli.config.as_deref(), |key| std::env::var(key).ok())
        .context("failed to load configuration")?;

    let manager = DocsetManager::new(&config, build_converter(&config))?;

    match cli.command {
        Command::Index {
            name,
            url,
            prefix,
            force,
        } => {
            let request = IndexRequest {
                name,
                url,
                path_prefix: prefix,
                force,
            };
            let outcome = manager.index(&request).await?;
            print_index_outcome(&outcome);
            Ok(outcome.is_success())
        }
        Command::List => {
            print_local_docsets(&manager.list_local()?);
            Ok(true)
        }
        Command::ListRemote {
            query,
            limit,
            offset,
        } => {
            if !manager.has_backend() {
                anyhow::bail!("no backend URL configured (set DOCHARVEST_BACKEND_URL)");
            }
            match manager.list_remote(query.as_deref(), limit, offset).await {
                Ok(docsets) => print_remote_docsets(&docsets),
                Err(e) => tracing::warn!("Failed to list remote docsets: {}", e),
            }
            Ok(true)
        }
        Command::Pull { identifier } => {
            let outcome = manager.pull(&identifier).await?;
            print_pull_outcome(&outcome);
            Ok(true)
        }
        Command::Push => {
            let report = manager.push().await?;
            print_push_report(&report);
            Ok(true)
        }
    }
}

/// Builds the remote converter when an API key is available
///
/// Commands served entirely from a cache tier never need one.
fn build_converter(config: &Config) -> Option<Arc<dyn Converter>> {
    config.converter.api_key.as_ref()?;
    match ChatCompletionsConverter::new(&config.converter) {
        Ok(converter) => Some(Arc::new(converter)),
        Err(e) => {
            tracing::warn!("Converter unavailable: {}", e);
            None
        }
    }
}
