//! herald DOM - Document Object Model
//!
//! Arena-backed document that models what the announcement engine touches:
//! elements, attributes, text content, selector queries, focus and the
//! active element. An optional mutation log records every change so callers
//! can observe write ordering.

mod attributes;
mod document;
mod mutation;
mod node;
mod selector;
mod tree;

use std::cell::RefCell;
use std::rc::Rc;

pub use attributes::{Attr, Attributes};
pub use document::Document;
pub use mutation::{MutationKind, MutationRecord};
pub use node::{ElementData, Node, NodeData};
pub use selector::{Compound, Selector, SimpleSelector};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Raw arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Document shared between the cooperating parts of a single-threaded host.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Wrap a document for sharing.
pub fn shared(document: Document) -> SharedDocument {
    Rc::new(RefCell::new(document))
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Cannot insert {0:?} into its own subtree")]
    HierarchyRequest(NodeId),

    #[error("Node {0:?} is not connected to the document")]
    Detached(NodeId),
}
