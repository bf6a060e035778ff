//! Command engine: which definitions apply to a page, and what commands
//! they produce there.
//!
//! - [`UrlMatcher`] selects definitions by URL pattern, preserving order
//! - [`resolve_label`] derives a row label from element text and title
//! - [`CommandExtractor`] queries the page and builds [`Command`]s
//!
//! [`Command`]: palette_core_types::Command

pub mod builtins;
pub mod debug;
pub mod errors;
pub mod extractor;
pub mod label;
pub mod matcher;

pub use builtins::{builtin_commands, BUILTIN_COPY_TEMPLATE_ID, BUILTIN_DEBUG_ID};
pub use debug::DebugReport;
pub use errors::QueryError;
pub use extractor::{id_prefix, resolve_elements, CommandExtractor};
pub use label::{dom_text, resolve_label, ResolvedLabel, FALLBACK_LABEL, LABEL_MAX_CHARS};
pub use matcher::UrlMatcher;
