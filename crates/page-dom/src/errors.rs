//! Error types for DOM access

use palette_core_types::{ElementRef, PaletteError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Selector failed to parse
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// XPath expression failed to parse or evaluate
    #[error("invalid xpath '{expression}': {reason}")]
    InvalidXPath { expression: String, reason: String },

    /// Element is no longer part of the document
    #[error("element {0} is detached")]
    Detached(ElementRef),

    /// Handle was issued by another document
    #[error("element {0} belongs to another document")]
    ForeignDocument(ElementRef),
}

impl DomError {
    /// Stale handles are expected during normal use and are not faults.
    pub fn is_stale(&self) -> bool {
        matches!(self, DomError::Detached(_) | DomError::ForeignDocument(_))
    }
}

impl From<DomError> for PaletteError {
    fn from(err: DomError) -> Self {
        PaletteError::new(err.to_string())
    }
}
