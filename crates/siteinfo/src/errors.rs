use palette_core_types::PaletteError;
use thiserror::Error;

/// Structural problems found in a SITEINFO batch.
///
/// Messages name the zero-based item and command position so they can be
/// shown verbatim on the settings surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Root must be an array")]
    RootNotArray,
    #[error("Item {item}: Missing 'url'")]
    MissingUrl { item: usize },
    #[error("Item {item}: 'commands' must be an array")]
    CommandsNotArray { item: usize },
    #[error("Item {item}, Command {command}: Missing 'xpath' or 'selector'")]
    MissingQuery { item: usize, command: usize },
    #[error("Item {item}, Command {command}: Unknown action '{tag}'")]
    UnknownAction {
        item: usize,
        command: usize,
        tag: String,
    },
}

#[derive(Debug, Error)]
pub enum SiteInfoError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<SiteInfoError> for PaletteError {
    fn from(value: SiteInfoError) -> Self {
        PaletteError::new(value.to_string())
    }
}
