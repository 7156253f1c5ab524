//! CLI module
//!
//! Command-line interface for planning and running page requests.
//!
//! # Commands
//!
//! - `explain` - Print the planned pipeline for a request
//! - `run` - Run a request against documents loaded from a file
//! - `validate` - Check a request file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
