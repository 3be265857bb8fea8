//! CLI module
//!
//! Command-line interface for paging through list endpoints.
//!
//! # Commands
//!
//! - `list` - Print every element of a collection, one JSON value per line

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{parse_filter, Runner};
