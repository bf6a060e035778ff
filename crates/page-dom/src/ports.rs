use std::time::Duration;

use palette_core_types::{DocumentId, ElementRef};
use serde::{Deserialize, Serialize};

use crate::errors::DomError;

/// Text-bearing properties of an element, as read for label derivation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementText {
    /// Rendered text (script/style content excluded, whitespace collapsed).
    pub inner_text: String,
    /// Raw concatenated text of all descendants.
    pub text_content: String,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub title: Option<String>,
    pub alt: Option<String>,
}

/// Two-phase visual pulse applied to a target before acting on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightPulse {
    /// How long the instant outline stays fully on.
    pub hold: Duration,
    /// How long the outline takes to fade back.
    pub fade: Duration,
}

impl Default for HighlightPulse {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(1000),
            fade: Duration::from_millis(1000),
        }
    }
}

/// Read side of a page.
pub trait PageQuery {
    fn document_id(&self) -> DocumentId;

    /// Full address of the page.
    fn location(&self) -> &str;

    fn title(&self) -> &str;

    /// All matches of a CSS selector, in document order.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementRef>, DomError>;

    /// Ordered snapshot of the elements an XPath expression selects.
    fn evaluate_xpath(&self, expression: &str) -> Result<Vec<ElementRef>, DomError>;

    /// `None` when the handle no longer resolves.
    fn element_text(&self, element: &ElementRef) -> Option<ElementText>;
}

/// Effect side of a page.
pub trait PageDriver {
    fn is_connected(&self, element: &ElementRef) -> bool;
    fn scroll_into_view(&self, element: &ElementRef) -> Result<(), DomError>;
    fn pulse_highlight(&self, element: &ElementRef, pulse: HighlightPulse)
        -> Result<(), DomError>;
    fn click(&self, element: &ElementRef) -> Result<(), DomError>;
    fn focus(&self, element: &ElementRef) -> Result<(), DomError>;
}

/// A page the palette can both query and drive.
pub trait Page: PageQuery + PageDriver {}

impl<T> Page for T where T: PageQuery + PageDriver {}
