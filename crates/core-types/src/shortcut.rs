//! Keyboard shortcut model.

use serde::{Deserialize, Serialize};

/// A key press as delivered by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: String,
    pub code: String,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
}

impl KeyInput {
    /// Unmodified key press, `code` left empty.
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }
}

/// Palette trigger shortcut.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutSpec {
    pub key: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub meta_key: bool,
}

impl Default for ShortcutSpec {
    fn default() -> Self {
        Self {
            key: "p".into(),
            code: "KeyP".into(),
            ctrl_key: true,
            shift_key: true,
            alt_key: false,
            meta_key: false,
        }
    }
}

impl ShortcutSpec {
    /// Modifiers must match exactly; then the physical `code` wins, with a
    /// case-insensitive `key` comparison as fallback.
    pub fn matches(&self, input: &KeyInput) -> bool {
        if input.ctrl_key != self.ctrl_key
            || input.shift_key != self.shift_key
            || input.alt_key != self.alt_key
            || input.meta_key != self.meta_key
        {
            return false;
        }
        if !self.code.is_empty() && input.code == self.code {
            return true;
        }
        input.key.to_lowercase() == self.key.to_lowercase()
    }

    /// Human readable form, e.g. `Ctrl+Shift+P`.
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.ctrl_key {
            parts.push("Ctrl".into());
        }
        if self.meta_key {
            parts.push("Cmd".into());
        }
        if self.alt_key {
            parts.push("Alt".into());
        }
        if self.shift_key {
            parts.push("Shift".into());
        }
        let key = if self.key == " " {
            "Space".to_string()
        } else if self.key.chars().count() == 1 {
            self.key.to_uppercase()
        } else {
            self.key.clone()
        };
        parts.push(key);
        parts.join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: &str, code: &str, ctrl: bool, shift: bool) -> KeyInput {
        KeyInput {
            key: key.into(),
            code: code.into(),
            ctrl_key: ctrl,
            shift_key: shift,
            alt_key: false,
            meta_key: false,
        }
    }

    #[test]
    fn default_shortcut_matches_ctrl_shift_p() {
        let spec = ShortcutSpec::default();
        assert!(spec.matches(&press("P", "KeyP", true, true)));
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let spec = ShortcutSpec::default();
        assert!(!spec.matches(&press("p", "KeyP", true, false)));
        let mut with_alt = press("p", "KeyP", true, true);
        with_alt.alt_key = true;
        assert!(!spec.matches(&with_alt));
    }

    #[test]
    fn key_fallback_is_case_insensitive() {
        let spec = ShortcutSpec::default();
        // Non-US layouts can report a different physical code.
        assert!(spec.matches(&press("P", "KeyR", true, true)));
        assert!(!spec.matches(&press("o", "KeyO", true, true)));
    }

    #[test]
    fn display_orders_modifiers_and_names_space() {
        assert_eq!(ShortcutSpec::default().display(), "Ctrl+Shift+P");
        let spec = ShortcutSpec {
            key: " ".into(),
            code: "Space".into(),
            ctrl_key: false,
            shift_key: false,
            alt_key: true,
            meta_key: true,
        };
        assert_eq!(spec.display(), "Cmd+Alt+Space");
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let spec: ShortcutSpec = serde_json::from_str(
            r#"{"key":"k","code":"KeyK","ctrlKey":false,"shiftKey":false,"altKey":true,"metaKey":false}"#,
        )
        .unwrap();
        assert!(spec.alt_key);
        assert_eq!(spec.display(), "Alt+K");
    }
}
