//! Shared primitives for the web command palette crates.
//!
//! Everything that crosses a crate boundary lives here: element handles,
//! action kinds, the extracted [`Command`] record, keyboard input and the
//! base error type the other crates convert into.

pub mod action;
pub mod command;
pub mod element;
pub mod shortcut;

pub use action::{ActionKind, UnknownAction};
pub use command::{Command, CommandId};
pub use element::{DocumentId, ElementRef, NodeId};
pub use shortcut::{KeyInput, ShortcutSpec};

use thiserror::Error;
use uuid::Uuid;

/// Shared error type the per-crate errors fold into.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("{message}")]
    Message { message: String },
}

impl PaletteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Identifier of one open/close cycle of the palette.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Short random token used to keep command ids unique inside a batch.
///
/// Nine lowercase alphanumerics, drawn from a fresh v4 uuid.
pub fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_suffix_is_nine_lowercase_alphanumerics() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn palette_error_displays_message() {
        let err = PaletteError::new("boom");
        assert_eq!(err.to_string(), "boom");
    }
}
