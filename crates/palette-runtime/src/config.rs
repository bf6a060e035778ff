use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use palette_core_types::ShortcutSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::RuntimeError;

pub const ENV_ALLOWED_CLICK_URLS: &str = "WEBPALETTE_ALLOWED_CLICK_URLS";
pub const ENV_EXCLUDED_URLS: &str = "WEBPALETTE_EXCLUDED_URLS";

/// Ordered list of URL patterns.
///
/// Deserializes from either a sequence or the newline-separated text the
/// settings surface produces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPatterns", into = "Vec<String>")]
pub struct PatternList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPatterns {
    Text(String),
    List(Vec<String>),
}

impl From<RawPatterns> for PatternList {
    fn from(raw: RawPatterns) -> Self {
        match raw {
            RawPatterns::Text(text) => PatternList::from_multiline(&text),
            RawPatterns::List(items) => PatternList::new(items),
        }
    }
}

impl From<PatternList> for Vec<String> {
    fn from(list: PatternList) -> Self {
        list.0
    }
}

impl PatternList {
    /// Blank entries are dropped.
    pub fn new(patterns: Vec<String>) -> Self {
        Self(
            patterns
                .into_iter()
                .filter(|pattern| !pattern.trim().is_empty())
                .collect(),
        )
    }

    /// One pattern per line. Commas belong to the pattern (`\d{1,3}`).
    pub fn from_multiline(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string).collect())
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runtime configuration of the palette.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub shortcut: ShortcutSpec,
    /// Pages where the palette never opens.
    pub excluded_urls: PatternList,
    /// Pages where `click` actions are allowed.
    pub allowed_click_urls: PatternList,
    /// External SITEINFO sources, in precedence order.
    pub sources: Vec<String>,
    pub local_siteinfo: Option<PathBuf>,
    pub reduced_motion: bool,
}

impl PaletteConfig {
    /// Parse YAML (or JSON, which YAML accepts).
    pub fn from_yaml_str(content: &str) -> Result<Self, RuntimeError> {
        serde_yaml::from_str(content).map_err(|err| RuntimeError::Config(format!("{}", err)))
    }

    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = fs::read_to_string(path)
            .map_err(|err| RuntimeError::Io(format!("{}: {}", path.display(), err)))?;
        Self::from_yaml_str(&content)
    }

    /// Apply overlays from the process environment.
    pub fn apply_env_overlays(&mut self) {
        self.apply_overlays_from(|key| env::var(key).ok());
    }

    /// Overlay pattern lists from `lookup`; set variables replace the file value.
    /// Values hold one pattern per line.
    pub fn apply_overlays_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ALLOWED_CLICK_URLS) {
            debug!(var = ENV_ALLOWED_CLICK_URLS, "allowed click urls overridden");
            self.allowed_click_urls = PatternList::from_multiline(&raw);
        }
        if let Some(raw) = lookup(ENV_EXCLUDED_URLS) {
            debug!(var = ENV_EXCLUDED_URLS, "excluded urls overridden");
            self.excluded_urls = PatternList::from_multiline(&raw);
        }
    }
}
