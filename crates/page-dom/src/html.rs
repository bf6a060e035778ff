//! HTML-backed page.
//!
//! The document is parsed once with `scraper` and mirrored into a flat
//! arena indexed in document order, so element handles stay plain indices.
//! CSS selectors are answered by `scraper`; XPath by the local evaluator.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use palette_core_types::{DocumentId, ElementRef, NodeId};
use scraper::{ElementRef as ScraperElement, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DomError;
use crate::ports::{ElementText, HighlightPulse, PageDriver, PageQuery};
use crate::xpath;

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(1);

const NON_RENDERED: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Elements that break the line in rendered text; everything else is inline.
const BLOCK_LEVEL: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td",
    "th", "thead", "tr", "ul",
];

#[derive(Clone, Debug)]
pub(crate) enum Child {
    Element(usize),
    Text(String),
}

#[derive(Clone, Debug)]
pub(crate) struct DomNode {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<Child>,
}

/// Element arena in document (pre-)order.
#[derive(Clone, Debug, Default)]
pub(crate) struct DomTree {
    pub(crate) nodes: Vec<DomNode>,
    pub(crate) roots: Vec<usize>,
}

impl DomTree {
    fn from_html(html: &Html) -> Self {
        let mut tree = DomTree::default();
        let root = tree.push_element(html.root_element(), None);
        tree.roots.push(root);
        tree
    }

    fn push_element(&mut self, element: ScraperElement<'_>, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        let value = element.value();
        self.nodes.push(DomNode {
            tag: value.name().to_ascii_lowercase(),
            attrs: value
                .attrs()
                .map(|(name, val)| (name.to_ascii_lowercase(), val.to_string()))
                .collect(),
            parent,
            children: Vec::new(),
        });
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.nodes[index]
                    .children
                    .push(Child::Text((**text).to_string())),
                Node::Element(_) => {
                    if let Some(child_element) = ScraperElement::wrap(child) {
                        let child_index = self.push_element(child_element, Some(index));
                        self.nodes[index].children.push(Child::Element(child_index));
                    }
                }
                _ => {}
            }
        }
        index
    }

    pub(crate) fn attr(&self, index: usize, name: &str) -> Option<&str> {
        self.nodes[index]
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn element_children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes[index].children.iter().filter_map(|child| match child {
            Child::Element(idx) => Some(*idx),
            Child::Text(_) => None,
        })
    }

    pub(crate) fn own_text(&self, index: usize) -> Vec<String> {
        self.nodes[index]
            .children
            .iter()
            .filter_map(|child| match child {
                Child::Text(text) => Some(text.clone()),
                Child::Element(_) => None,
            })
            .collect()
    }

    pub(crate) fn text_content(&self, index: usize) -> String {
        let mut out = String::new();
        self.collect_text(index, &mut out, false);
        out
    }

    fn inner_text(&self, index: usize) -> String {
        let mut out = String::new();
        self.collect_text(index, &mut out, true);
        collapse_whitespace(&out)
    }

    fn collect_text(&self, index: usize, out: &mut String, rendered_only: bool) {
        for child in &self.nodes[index].children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(idx) => {
                    if !rendered_only {
                        self.collect_text(*idx, out, false);
                        continue;
                    }
                    if !self.is_rendered(*idx) {
                        continue;
                    }
                    let block = self.is_block(*idx);
                    if block {
                        out.push(' ');
                    }
                    self.collect_text(*idx, out, true);
                    if block {
                        out.push(' ');
                    }
                }
            }
        }
    }

    fn is_block(&self, index: usize) -> bool {
        BLOCK_LEVEL.contains(&self.nodes[index].tag.as_str())
    }

    fn is_rendered(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        if NON_RENDERED.contains(&node.tag.as_str()) || self.attr(index, "hidden").is_some() {
            return false;
        }
        match self.attr(index, "style") {
            Some(style) => {
                let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
                !compact.to_ascii_lowercase().contains("display:none")
            }
            None => true,
        }
    }

    /// True when `index` is `ancestor` or lies beneath it.
    fn within(&self, index: usize, ancestor: usize) -> bool {
        let mut cursor = Some(index);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes[current].parent;
        }
        false
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Effect performed through [`PageDriver`], kept for inspection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DomEffect {
    ScrollIntoView { node: NodeId },
    Highlight { node: NodeId, hold_ms: u64, fade_ms: u64 },
    Click { node: NodeId },
    Focus { node: NodeId },
}

/// A parsed HTML document standing in for a live page.
pub struct HtmlPage {
    id: DocumentId,
    location: String,
    title: String,
    html: Html,
    tree: DomTree,
    detached: RefCell<HashSet<usize>>,
    focused: Cell<Option<usize>>,
    effects: RefCell<Vec<DomEffect>>,
}

impl HtmlPage {
    pub fn parse(location: impl Into<String>, source: &str) -> Self {
        let html = Html::parse_document(source);
        let tree = DomTree::from_html(&html);
        let title = tree
            .nodes
            .iter()
            .position(|node| node.tag == "title")
            .map(|idx| collapse_whitespace(&tree.text_content(idx)))
            .unwrap_or_default();
        let id = DocumentId(NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed));
        debug!(document = id.0, elements = tree.nodes.len(), "parsed html page");
        Self {
            id,
            location: location.into(),
            title,
            html,
            tree,
            detached: RefCell::new(HashSet::new()),
            focused: Cell::new(None),
            effects: RefCell::new(Vec::new()),
        }
    }

    /// Remove an element (and its subtree) from the document.
    pub fn detach(&self, element: &ElementRef) {
        if element.document == self.id && element.node.0 < self.tree.nodes.len() {
            self.detached.borrow_mut().insert(element.node.0);
        }
    }

    pub fn effects(&self) -> Vec<DomEffect> {
        self.effects.borrow().clone()
    }

    pub fn take_effects(&self) -> Vec<DomEffect> {
        std::mem::take(&mut *self.effects.borrow_mut())
    }

    pub fn focused(&self) -> Option<ElementRef> {
        self.focused.get().map(|idx| self.handle(idx))
    }

    /// Short `tag#id.class` description for logs and CLI output.
    pub fn describe(&self, element: &ElementRef) -> Option<String> {
        let index = self.resolve(element).ok()?;
        let mut out = self.tree.nodes[index].tag.clone();
        if let Some(id) = self.tree.attr(index, "id") {
            out.push('#');
            out.push_str(id);
        }
        if let Some(class) = self.tree.attr(index, "class") {
            for name in class.split_whitespace() {
                out.push('.');
                out.push_str(name);
            }
        }
        Some(out)
    }

    fn handle(&self, index: usize) -> ElementRef {
        ElementRef::new(self.id, NodeId(index))
    }

    fn is_live(&self, index: usize) -> bool {
        let detached = self.detached.borrow();
        detached.is_empty() || !detached.iter().any(|gone| self.tree.within(index, *gone))
    }

    fn resolve(&self, element: &ElementRef) -> Result<usize, DomError> {
        if element.document != self.id || element.node.0 >= self.tree.nodes.len() {
            return Err(DomError::ForeignDocument(*element));
        }
        if !self.is_live(element.node.0) {
            return Err(DomError::Detached(*element));
        }
        Ok(element.node.0)
    }

    fn record(&self, effect: DomEffect) {
        self.effects.borrow_mut().push(effect);
    }
}

impl PageQuery for HtmlPage {
    fn document_id(&self) -> DocumentId {
        self.id
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementRef>, DomError> {
        let parsed = Selector::parse(selector).map_err(|err| DomError::InvalidSelector {
            selector: selector.to_string(),
            reason: err.to_string(),
        })?;
        // Same pre-order walk the arena was built from, so positions line up.
        Ok(self
            .html
            .root_element()
            .descendants()
            .filter_map(ScraperElement::wrap)
            .enumerate()
            .filter(|(index, element)| parsed.matches(element) && self.is_live(*index))
            .map(|(index, _)| self.handle(index))
            .collect())
    }

    fn evaluate_xpath(&self, expression: &str) -> Result<Vec<ElementRef>, DomError> {
        let live = |index: usize| self.is_live(index);
        let nodes = xpath::evaluate(&self.tree, expression, &live).map_err(|reason| {
            DomError::InvalidXPath {
                expression: expression.to_string(),
                reason,
            }
        })?;
        Ok(nodes.into_iter().map(|index| self.handle(index)).collect())
    }

    fn element_text(&self, element: &ElementRef) -> Option<ElementText> {
        let index = self.resolve(element).ok()?;
        let tree = &self.tree;
        let owned = |name: &str| tree.attr(index, name).map(str::to_string);
        let value = if tree.nodes[index].tag == "textarea" {
            Some(tree.text_content(index))
        } else {
            owned("value")
        };
        Some(ElementText {
            inner_text: tree.inner_text(index),
            text_content: tree.text_content(index),
            value,
            placeholder: owned("placeholder"),
            aria_label: owned("aria-label"),
            title: owned("title"),
            alt: owned("alt"),
        })
    }
}

impl PageDriver for HtmlPage {
    fn is_connected(&self, element: &ElementRef) -> bool {
        self.resolve(element).is_ok()
    }

    fn scroll_into_view(&self, element: &ElementRef) -> Result<(), DomError> {
        let index = self.resolve(element)?;
        self.record(DomEffect::ScrollIntoView {
            node: NodeId(index),
        });
        Ok(())
    }

    fn pulse_highlight(
        &self,
        element: &ElementRef,
        pulse: HighlightPulse,
    ) -> Result<(), DomError> {
        let index = self.resolve(element)?;
        self.record(DomEffect::Highlight {
            node: NodeId(index),
            hold_ms: pulse.hold.as_millis() as u64,
            fade_ms: pulse.fade.as_millis() as u64,
        });
        Ok(())
    }

    fn click(&self, element: &ElementRef) -> Result<(), DomError> {
        let index = self.resolve(element)?;
        self.record(DomEffect::Click {
            node: NodeId(index),
        });
        Ok(())
    }

    fn focus(&self, element: &ElementRef) -> Result<(), DomError> {
        let index = self.resolve(element)?;
        self.focused.set(Some(index));
        self.record(DomEffect::Focus {
            node: NodeId(index),
        });
        Ok(())
    }
}
