//! Subcommand implementations for mali-memtrack.
//!
//! This module contains the implementations for all CLI subcommands:
//! - `query`: Report unaccounted memory for one process
//! - `check`: Validate configuration and data source accessibility
//! - `config`: Generate configuration files

pub mod check;
pub mod config;
pub mod query;

pub use check::command_check;
pub use config::command_config;
pub use query::command_query;
