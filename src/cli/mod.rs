pub mod analyze;
pub mod catalog;
pub mod config;
pub mod schema;

use crate::config::Backend;
use crate::output::ReportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "biotools-agent")]
#[command(
    author,
    version,
    about = "Parallel LLM analysis of bioinformatics tool repositories"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a repository and write reports
    Analyze(AnalyzeArgs),

    /// Show the effective configuration and any problems with it
    Config(ConfigArgs),

    /// List analysis tasks and agent roles
    Catalog(CatalogArgs),

    /// Print JSON Schema for the config file or the report
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct AnalyzeArgs {
    /// GitHub URL, file:// URL or local checkout
    #[arg(value_name = "REPO_URL")]
    pub repo_url: String,

    /// Path to config file
    #[arg(short, long, default_value = "biotools.yaml")]
    pub config: PathBuf,

    /// Load environment variables from this file (default: .env)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Override output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report formats (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub formats: Option<Vec<ReportFormat>>,

    /// Inference backend: auto, agent or chat
    #[arg(long)]
    pub backend: Option<Backend>,

    /// Do not save the result to the database
    #[arg(long)]
    pub no_save_to_db: bool,

    /// Skip the external dependency and code auditors
    #[arg(long)]
    pub no_security_scan: bool,

    /// Keep the temporary clone on disk
    #[arg(long)]
    pub keep_clone: bool,
}

#[derive(Parser, Clone)]
pub struct ConfigArgs {
    /// Path to config file
    #[arg(short, long, default_value = "biotools.yaml")]
    pub config: PathBuf,

    /// Load environment variables from this file (default: .env)
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct CatalogArgs {
    /// Path to config file
    #[arg(short, long, default_value = "biotools.yaml")]
    pub config: PathBuf,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Describe the JSON report instead of the config file
    #[arg(long)]
    pub report: bool,
}
