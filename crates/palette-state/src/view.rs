use serde::Serialize;

use crate::state::PaletteState;

pub const NO_RESULTS: &str = "No commands found";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub label: String,
    pub description: String,
    pub active: bool,
}

/// What the palette list shows right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaletteView {
    Hidden,
    Empty { message: &'static str },
    Rows { rows: Vec<RowView> },
}

impl PaletteState {
    pub fn view(&self) -> PaletteView {
        if !self.is_open() {
            return PaletteView::Hidden;
        }
        let selected = self.selected_index();
        let rows: Vec<RowView> = self
            .filtered()
            .into_iter()
            .enumerate()
            .map(|(index, cmd)| RowView {
                label: cmd.label.clone(),
                description: cmd.description.clone(),
                active: Some(index) == selected,
            })
            .collect();
        if rows.is_empty() {
            PaletteView::Empty {
                message: NO_RESULTS,
            }
        } else {
            PaletteView::Rows { rows }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_core_types::{ActionKind, Command};

    #[test]
    fn rows_mark_the_cursor() {
        let (mut state, _rx) = PaletteState::new();
        assert_eq!(state.view(), PaletteView::Hidden);
        state.open(vec![
            Command::builtin("a", "Alpha", ActionKind::Click),
            Command::builtin("b", "Beta", ActionKind::Click),
        ]);
        state.move_selection(1);
        match state.view() {
            PaletteView::Rows { rows } => {
                assert_eq!(rows.len(), 2);
                assert!(!rows[0].active);
                assert!(rows[1].active);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn empty_filter_shows_no_results_message() {
        let (mut state, _rx) = PaletteState::new();
        state.open(vec![Command::builtin("a", "Alpha", ActionKind::Click)]);
        state.set_query("zz");
        assert_eq!(
            state.view(),
            PaletteView::Empty {
                message: "No commands found"
            }
        );
        let json = serde_json::to_value(state.view()).unwrap();
        assert_eq!(json["kind"], "empty");
    }
}
