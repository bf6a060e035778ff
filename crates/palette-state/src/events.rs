use palette_core_types::Command;
use serde::Serialize;
use tokio::sync::mpsc;

/// Why an open palette closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// A command was confirmed.
    Confirmed,
    /// Escape, or the trigger shortcut pressed again.
    Cancelled,
    /// Click on the backdrop outside the list.
    Backdrop,
    /// The input lost focus.
    FocusLost,
}

/// Messages the palette sends to its host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaletteEvent {
    /// The input should take focus; the host may defer this briefly.
    FocusInput,
    /// Run this command. Always preceded by the palette closing.
    Execute(Command),
    Closed(CloseReason),
}

pub type EventSender = mpsc::UnboundedSender<PaletteEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PaletteEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
