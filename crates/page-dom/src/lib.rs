//! DOM ports for the command palette.
//!
//! The palette core never owns DOM nodes. It talks to the page through two
//! ports:
//! - [`PageQuery`] answers structural queries (CSS selectors, XPath) and
//!   describes elements for label derivation
//! - [`PageDriver`] performs effects on elements (scroll, highlight, click,
//!   focus) after checking they are still connected
//!
//! [`HtmlPage`] implements both over a parsed HTML document and is what the
//! CLI and the tests drive.

pub mod errors;
pub mod html;
pub mod ports;
mod xpath;

pub use errors::DomError;
pub use html::{DomEffect, HtmlPage};
pub use ports::{ElementText, HighlightPulse, Page, PageDriver, PageQuery};
