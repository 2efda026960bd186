//! # pipewright CLI
//!
//! Command-line interface for pipewright - build and run method pipelines
//! from natural-language queries.
//!
//! ## Usage
//!
//! - `pipewright "query"` - Plan and execute a single query
//! - `pipewright run "query"` - Same, as an explicit subcommand
//! - `pipewright capabilities` - Show the built-in capabilities
//! - `pipewright exec plan.json` - Execute a hand-written plan

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{capabilities_command, exec_command, run_command};
use config::CliConfigLoader;

/// pipewright - plan and run method pipelines with an LLM
#[derive(Parser)]
#[command(name = "pipewright")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn natural-language queries into dependency-resolved method pipelines")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to use (openai, anthropic, azure_openai)
    #[arg(long)]
    protocol: Option<String>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Maximum number of executor passes
    #[arg(long)]
    max_passes: Option<usize>,

    /// Output trajectory file
    #[arg(long)]
    trajectory_file: Option<PathBuf>,

    /// The query to handle (if provided, runs in single-query mode)
    query: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan and execute a single query
    Run {
        /// The query to handle
        query: String,
    },

    /// Show available capabilities
    Capabilities,

    /// Execute a plan file without calling the LLM
    Exec {
        /// Path to a plan in JSON (or Python literal) form
        plan: PathBuf,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pipewright_core::init_tracing_with_debug(cli.verbose);

    let config_loader = build_config_loader(&cli);

    match (cli.query, cli.command) {
        (Some(query), None) | (None, Some(Commands::Run { query })) => {
            run_command(query, config_loader, cli.max_passes, cli.trajectory_file).await
        }
        (Some(_), Some(_)) => Err(anyhow!("Cannot specify both a query and a subcommand")),
        (None, Some(Commands::Capabilities)) => capabilities_command().await,
        (None, Some(Commands::Exec { plan })) => exec_command(&plan, cli.max_passes).await,
        (None, None) => Err(anyhow!(
            "No query given. Try `pipewright \"add 2 and 3\"` or `pipewright --help`"
        )),
    }
}
