//! zeroshot CLI - HTTP service for zero-shot text classification.
//!
//! Clients send free text and a set of candidate labels; the service answers
//! with the most likely label and a confidence score for each label.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the default local NLI model
//! zeroshot models download
//!
//! # Serve on the configured address
//! zeroshot serve
//!
//! # Serve through a hosted inference API instead
//! zeroshot serve --backend remote --port 9000
//!
//! # View configuration
//! zeroshot config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// zeroshot - zero-shot text classification over HTTP.
#[derive(Parser, Debug)]
#[command(name = "zeroshot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ZEROSHOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the classification HTTP server
    Serve(cli::serve::ServeArgs),

    /// Manage the local NLI model (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `zeroshot config path`."
            );
            zeroshot_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("zeroshot v{}", zeroshot_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    }
}
