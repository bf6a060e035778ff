//! The command instance produced for one palette session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::element::ElementRef;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One actionable item shown in the palette.
///
/// Built fresh every time the palette opens and dropped when it closes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    /// Display label, at most 100 characters.
    pub label: String,
    /// Secondary text; empty when it would repeat the label.
    pub description: String,
    /// Target element, `None` for built-in host commands.
    pub target: Option<ElementRef>,
    pub action: ActionKind,
    /// URL pattern of the owning definition.
    pub definition_id: Option<String>,
    /// Provenance of the owning definition (`"local"` or a source origin).
    pub source_url: Option<String>,
}

impl Command {
    /// A command that acts on the host rather than on a page element.
    pub fn builtin(id: &str, label: &str, action: ActionKind) -> Self {
        Self {
            id: CommandId(id.to_string()),
            label: label.to_string(),
            description: String::new(),
            target: None,
            action,
            definition_id: None,
            source_url: None,
        }
    }
}
