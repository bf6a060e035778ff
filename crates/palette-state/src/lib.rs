//! Palette filter/selection state machine.
//!
//! [`PaletteState`] is an ordinary value owned by the host. Transitions are
//! method calls; anything the host must react to (focus the input, run a
//! command, palette closed) arrives on the [`PaletteEvent`] channel.

pub mod events;
pub mod keys;
pub mod state;
pub mod view;

pub use events::{channel, CloseReason, EventReceiver, EventSender, PaletteEvent};
pub use keys::KeyOutcome;
pub use state::{filter_indices, Mode, PaletteState};
pub use view::{PaletteView, RowView, NO_RESULTS};
