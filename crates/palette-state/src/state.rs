//! The palette as an explicit state value.

use palette_core_types::Command;
use tracing::{debug, trace, warn};

use crate::events::{self, CloseReason, EventReceiver, EventSender, PaletteEvent};

/// Open/closed state. While open, `filtered` holds indices into the full
/// command list in their original order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Closed,
    Open {
        query: String,
        filtered: Vec<usize>,
        selected: usize,
    },
}

/// Indices of `commands` whose label contains `query`, ignoring case.
///
/// An empty query keeps everything. The result is always in list order.
pub fn filter_indices(commands: &[Command], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..commands.len()).collect();
    }
    let needle = query.to_lowercase();
    commands
        .iter()
        .enumerate()
        .filter(|(_, cmd)| cmd.label.to_lowercase().contains(&needle))
        .map(|(index, _)| index)
        .collect()
}

pub struct PaletteState {
    commands: Vec<Command>,
    mode: Mode,
    debug_visible: bool,
    debug_info: String,
    events: EventSender,
}

impl PaletteState {
    /// A closed palette and the receiving end of its event channel.
    pub fn new() -> (Self, EventReceiver) {
        let (events, rx) = events::channel();
        (Self::with_sender(events), rx)
    }

    pub fn with_sender(events: EventSender) -> Self {
        Self {
            commands: Vec::new(),
            mode: Mode::Closed,
            debug_visible: false,
            debug_info: String::new(),
            events,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        matches!(self.mode, Mode::Open { .. })
    }

    /// Full command list of the current (or last) session.
    pub fn all_commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn query(&self) -> &str {
        match &self.mode {
            Mode::Open { query, .. } => query,
            Mode::Closed => "",
        }
    }

    /// Visible commands in display order; empty while closed.
    pub fn filtered(&self) -> Vec<&Command> {
        match &self.mode {
            Mode::Open { filtered, .. } => filtered.iter().map(|i| &self.commands[*i]).collect(),
            Mode::Closed => Vec::new(),
        }
    }

    /// Cursor position, `None` while closed or when nothing is visible.
    pub fn selected_index(&self) -> Option<usize> {
        match &self.mode {
            Mode::Open { filtered, selected, .. } if !filtered.is_empty() => Some(*selected),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<&Command> {
        match &self.mode {
            Mode::Open { filtered, selected, .. } => {
                filtered.get(*selected).map(|i| &self.commands[*i])
            }
            Mode::Closed => None,
        }
    }

    /// Open with a fresh command list.
    ///
    /// Opening an already open palette replaces the list, re-applies the
    /// current query and puts the cursor back on the first row.
    pub fn open(&mut self, commands: Vec<Command>) {
        self.commands = commands;
        let query = match &self.mode {
            Mode::Open { query, .. } => query.clone(),
            Mode::Closed => String::new(),
        };
        if !query.is_empty() {
            debug!(query = %query, "palette reopened while open, re-filtering");
        }
        self.enter_open(query);
    }

    /// Open again with the list from the last `open`, query cleared.
    pub fn reopen(&mut self) {
        self.enter_open(String::new());
    }

    fn enter_open(&mut self, query: String) {
        let filtered = filter_indices(&self.commands, &query);
        debug!(
            total = self.commands.len(),
            visible = filtered.len(),
            "palette open"
        );
        self.mode = Mode::Open {
            query,
            filtered,
            selected: 0,
        };
        self.emit(PaletteEvent::FocusInput);
    }

    /// Re-filter on every keystroke. Ignored while closed.
    pub fn set_query(&mut self, text: &str) {
        let Mode::Open {
            query,
            filtered,
            selected,
        } = &mut self.mode
        else {
            return;
        };
        *query = text.to_string();
        *filtered = filter_indices(&self.commands, text);
        *selected = 0;
        trace!(query = %text, visible = filtered.len(), "palette filtered");
    }

    /// Move the cursor by `delta` rows, clamped to the visible list.
    pub fn move_selection(&mut self, delta: isize) {
        if let Mode::Open {
            filtered, selected, ..
        } = &mut self.mode
        {
            let last = filtered.len().saturating_sub(1) as isize;
            *selected = (*selected as isize + delta).clamp(0, last) as usize;
        }
    }

    /// Close and emit the selected command. No-op when nothing is selected.
    pub fn confirm(&mut self) -> Option<Command> {
        let command = self.selected()?.clone();
        self.close(CloseReason::Confirmed);
        self.emit(PaletteEvent::Execute(command.clone()));
        Some(command)
    }

    /// Click on a visible row: select it and confirm.
    pub fn click_row(&mut self, row: usize) -> Option<Command> {
        match &mut self.mode {
            Mode::Open {
                filtered, selected, ..
            } if row < filtered.len() => {
                *selected = row;
            }
            _ => return None,
        }
        self.confirm()
    }

    pub fn cancel(&mut self) {
        self.close(CloseReason::Cancelled);
    }

    pub fn backdrop_click(&mut self) {
        self.close(CloseReason::Backdrop);
    }

    pub fn blur(&mut self) {
        self.close(CloseReason::FocusLost);
    }

    fn close(&mut self, reason: CloseReason) {
        if !self.is_open() {
            return;
        }
        self.mode = Mode::Closed;
        debug!(?reason, "palette closed");
        self.emit(PaletteEvent::Closed(reason));
    }

    pub fn is_debug_visible(&self) -> bool {
        self.debug_visible
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
    }

    pub fn show_debug(&mut self) {
        self.debug_visible = true;
    }

    pub fn debug_info(&self) -> &str {
        &self.debug_info
    }

    pub fn set_debug_info(&mut self, info: impl Into<String>) {
        self.debug_info = info.into();
    }

    fn emit(&self, event: PaletteEvent) {
        if self.events.send(event).is_err() {
            warn!("palette event dropped: host receiver is gone");
        }
    }
}
