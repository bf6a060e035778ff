//! Ties the palette crates together for one page.
//!
//! [`PaletteSession`] listens for the trigger shortcut, builds the command
//! list from the current [`DefinitionStore`] snapshot and runs whatever the
//! user confirms. [`PaletteConfig`] carries the user's settings.
//!
//! [`DefinitionStore`]: palette_siteinfo::DefinitionStore

pub mod config;
pub mod errors;
pub mod session;

pub use config::{PaletteConfig, PatternList, ENV_ALLOWED_CLICK_URLS, ENV_EXCLUDED_URLS};
pub use errors::RuntimeError;
pub use session::{KeyResult, PaletteSession, TriggerOutcome};
