//! Web command palette CLI library
//!
//! Exposes the subcommand implementations for integration testing

pub mod commands;
pub mod config;
pub mod errors;
pub mod output;

pub use config::{default_config_path, load_config};
pub use errors::CliError;
pub use output::{render, OutputFormat};
