use palette_core_types::KeyInput;

use crate::state::PaletteState;

/// Whether a key press was consumed by the palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Consumed; the host should suppress the default action.
    Handled,
    Ignored,
}

impl PaletteState {
    /// Route a key press from the palette input.
    pub fn handle_key(&mut self, input: &KeyInput) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match input.key.as_str() {
            "ArrowDown" => self.move_selection(1),
            "ArrowUp" => self.move_selection(-1),
            "Enter" => {
                self.confirm();
            }
            "Escape" => self.cancel(),
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_core_types::{ActionKind, Command};

    #[test]
    fn arrows_enter_and_escape_are_consumed() {
        let (mut state, _rx) = PaletteState::new();
        state.open(vec![
            Command::builtin("a", "a", ActionKind::Focus),
            Command::builtin("b", "b", ActionKind::Focus),
        ]);
        assert_eq!(state.handle_key(&KeyInput::plain("ArrowDown")), KeyOutcome::Handled);
        assert_eq!(state.selected_index(), Some(1));
        assert_eq!(state.handle_key(&KeyInput::plain("ArrowUp")), KeyOutcome::Handled);
        assert_eq!(state.selected_index(), Some(0));
        assert_eq!(state.handle_key(&KeyInput::plain("x")), KeyOutcome::Ignored);
        assert_eq!(state.handle_key(&KeyInput::plain("Escape")), KeyOutcome::Handled);
        assert!(!state.is_open());
        assert_eq!(state.handle_key(&KeyInput::plain("Enter")), KeyOutcome::Ignored);
    }

    #[test]
    fn enter_on_empty_list_stays_open() {
        let (mut state, _rx) = PaletteState::new();
        state.open(Vec::new());
        assert_eq!(state.handle_key(&KeyInput::plain("Enter")), KeyOutcome::Handled);
        assert!(state.is_open());
    }
}
