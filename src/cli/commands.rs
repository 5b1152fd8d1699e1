//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the Bitbucket Cloud API
#[derive(Parser, Debug)]
#[command(name = "tap-bitbucket")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the configuration specification
    Spec,

    /// Test connection to the API
    Check,

    /// Print the stream catalog
    Discover,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,

        /// Write the final state to this file
        #[arg(long)]
        state_out: Option<PathBuf>,
    },
}

impl Commands {
    /// Parse the comma-separated stream selection of a read command
    pub fn stream_selection(streams: Option<&str>) -> Option<Vec<String>> {
        let names: Vec<String> = streams?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }
}
