//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Print the configuration specification
//! - `check` - Test connection to the API
//! - `discover` - Print the stream catalog
//! - `read` - Extract data from streams as Singer messages

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
