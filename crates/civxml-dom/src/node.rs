//! Node storage for the document arena.

/// Compact node identifier (index into the document arena).
///
/// Ids stay valid for the lifetime of the document. Removed nodes are
/// tombstoned, so an id is never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node, parent of the root element.
    pub const DOCUMENT: NodeId = NodeId(0);

    /// Arena index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type and payload of an XML node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element with its attributes in source order
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Text content
    Text(String),
    /// CDATA section
    CData(String),
    /// Comment
    Comment(String),
}

impl NodeKind {
    /// Create an element kind with no attributes.
    pub fn element(name: impl Into<String>) -> Self {
        NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
        }
    }
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub removed: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            removed: false,
        }
    }

    #[inline]
    pub fn element_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}
