//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keyset pagination over aggregation pipelines
#[derive(Parser, Debug)]
#[command(name = "aggpage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Page request file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub request: Option<PathBuf>,

    /// Collection the request pages over
    #[arg(short, long, global = true, default_value = "items")]
    pub collection: String,

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
    /// Print the planned pipeline without running it
    Explain {
        /// Cursor token to plan a follow-up page
        #[arg(long)]
        cursor: Option<String>,

        /// Fixed stash suffix (defaults to the current time in milliseconds)
        #[arg(long)]
        stash_suffix: Option<String>,
    },

    /// Run a request against documents loaded from a file
    Run {
        /// Seed documents (JSON/YAML list, or a map of collection to list)
        #[arg(short, long)]
        data: PathBuf,

        /// Cursor token to start from
        #[arg(long)]
        cursor: Option<String>,

        /// Default page size when the request has none
        #[arg(long)]
        default_limit: Option<u32>,

        /// Upper bound on the page size
        #[arg(long)]
        max_limit: Option<u32>,

        /// Number of pages to fetch, following cursors
        #[arg(long, default_value = "1")]
        pages: usize,
    },

    /// Validate a request file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Indented JSON
    Pretty,
}
