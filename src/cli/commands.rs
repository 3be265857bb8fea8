//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Page through billing API collections
#[derive(Parser, Debug)]
#[command(name = "recurly-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML); falls back to RECURLY_* env vars
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every element of a list endpoint
    List {
        /// Collection path (e.g. /accounts)
        path: String,

        /// Filter parameter as key=value (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Stop after this many elements
        #[arg(long)]
        limit: Option<usize>,

        /// Use the blocking fetch path instead of async
        #[arg(long)]
        blocking: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one element per line)
    Json,
    /// Human-readable output
    Pretty,
}
