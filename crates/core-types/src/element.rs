//! Non-owning element handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one loaded document. A reload produces a new id, so handles
/// taken from an earlier document never alias nodes of the current one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// Position of an element inside its document.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Weak reference to a live element.
///
/// Holding one does not keep the element alive; the page that issued it
/// answers whether it is still connected before anything acts on it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub document: DocumentId,
    pub node: NodeId,
}

impl ElementRef {
    pub fn new(document: DocumentId, node: NodeId) -> Self {
        Self { document, node }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc{}#{}", self.document.0, self.node.0)
    }
}
