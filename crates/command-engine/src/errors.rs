//! Error types for matching and extraction

use palette_core_types::PaletteError;
use palette_page_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// URL pattern failed to compile
    #[error("invalid url pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Element query rejected by the page
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<QueryError> for PaletteError {
    fn from(err: QueryError) -> Self {
        PaletteError::new(err.to_string())
    }
}
