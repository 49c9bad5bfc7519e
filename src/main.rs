use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod analysis;
mod cli;
mod config;
mod discovery;
mod error;
mod github;
mod history;
mod output;
mod parser;
mod provider;
mod storage;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("biotools_agent=debug")
    } else {
        EnvFilter::new("biotools_agent=warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args).await,
        Commands::Config(args) => cli::config::execute(args),
        Commands::Catalog(args) => cli::catalog::execute(args),
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
