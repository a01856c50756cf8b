use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::report::Format;

#[derive(Parser)]
#[command(name = "kvscan")]
#[command(about = "Classify and audit the contents of editor key-value stores", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, global = true, env = "KVSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a store and write reports
    Scan(ScanArgs),

    /// List tables, columns and row counts of a store
    Tables {
        /// Path to the store (default: state.vscdb lookup)
        store: Option<PathBuf>,
    },

    /// Show the active configuration
    Config {
        /// Only print the config file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(clap::Args)]
pub struct ScanArgs {
    /// Path to the store (default: state.vscdb lookup)
    pub store: Option<PathBuf>,

    /// Cap the number of matches and skip the regex pass
    #[arg(long)]
    pub quick: bool,

    /// Search for these keywords instead of the configured taxonomy
    #[arg(short, long, value_delimiter = ',')]
    pub keyword: Vec<String>,

    /// Rows fetched per page (default from config: 500)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Stop after this many matches, 0 for no limit
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Write high-sensitivity values to reports unmasked
    #[arg(long)]
    pub include_sensitive: bool,

    /// Directory that receives the run folder (default from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report formats to write (default from config: all)
    #[arg(short, long, value_enum)]
    pub format: Vec<Format>,

    /// Only print the summary
    #[arg(long)]
    pub no_export: bool,
}
