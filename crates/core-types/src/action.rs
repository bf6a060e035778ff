//! Closed set of actions a command can request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Action requested by a command definition.
///
/// The wire tags match the SITEINFO format: `click`, `focus`, `copy-text`,
/// and the reserved host-level tags `options`, `debug` and `copy-template`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Click the target element, then focus it.
    #[default]
    #[serde(rename = "click")]
    Click,
    /// Focus the target element.
    #[serde(rename = "focus")]
    Focus,
    /// Copy the target element's text to the clipboard.
    #[serde(rename = "copy-text")]
    CopyText,
    /// Open the settings surface.
    #[serde(rename = "options")]
    OpenSettings,
    /// Toggle the palette's debug panel.
    #[serde(rename = "debug")]
    ToggleDebug,
    /// Copy a generated SITEINFO template for the current page.
    #[serde(rename = "copy-template")]
    CopyTemplate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Click,
        ActionKind::Focus,
        ActionKind::CopyText,
        ActionKind::OpenSettings,
        ActionKind::ToggleDebug,
        ActionKind::CopyTemplate,
    ];

    /// Wire tag of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Focus => "focus",
            ActionKind::CopyText => "copy-text",
            ActionKind::OpenSettings => "options",
            ActionKind::ToggleDebug => "debug",
            ActionKind::CopyTemplate => "copy-template",
        }
    }

    /// Reserved actions act on the host and never touch a page element.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            ActionKind::OpenSettings | ActionKind::ToggleDebug | ActionKind::CopyTemplate
        )
    }

    pub fn targets_element(&self) -> bool {
        !self.is_reserved()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| UnknownAction(raw.to_string()))
    }
}
