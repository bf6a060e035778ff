use std::fmt::Display;

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

/// Render a report in the requested format.
pub fn render<T>(value: &T, format: OutputFormat) -> Result<String>
where
    T: Serialize + Display,
{
    match format {
        OutputFormat::Human => Ok(value.to_string()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).context("Failed to serialize output as YAML")
        }
    }
}
