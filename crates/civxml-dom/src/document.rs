//! The document arena: navigation and in-place mutation.

use crate::node::{Node, NodeId, NodeKind};
use crate::{Error, Result};

/// The `<?xml ...?>` declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Declaration {
    /// Create a declaration with the given encoding.
    pub fn new(version: impl Into<String>, encoding: Option<&str>) -> Self {
        Self {
            version: version.into(),
            encoding: encoding.map(str::to_string),
            standalone: None,
        }
    }

    /// Whether the declared encoding is ISO-8859-1 (Latin-1).
    pub fn is_latin1(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|enc| is_latin1_label(enc))
    }
}

pub(crate) fn is_latin1_label(label: &str) -> bool {
    let label = label.trim();
    label.eq_ignore_ascii_case("ISO-8859-1")
        || label.eq_ignore_ascii_case("ISO8859-1")
        || label.eq_ignore_ascii_case("latin1")
        || label.eq_ignore_ascii_case("latin-1")
}

/// A mutable XML document.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Element text
/// follows the common DOM convention of "the first child, if it is a text
/// node", so `<Type>UNIT_WARRIOR</Type>` has the text `UNIT_WARRIOR`.
///
/// # Example
///
/// ```
/// use civxml_dom::XmlDocument;
///
/// let mut doc = XmlDocument::parse("<Units><Unit><Type>UNIT_WARRIOR</Type></Unit></Units>")?;
/// let root = doc.root_element().unwrap();
/// let unit = doc.first_child_element(root, Some("Unit")).unwrap();
/// let ty = doc.first_child_element(unit, Some("Type")).unwrap();
/// assert_eq!(doc.text(ty), Some("UNIT_WARRIOR"));
///
/// doc.set_text(ty, "UNIT_ARCHER")?;
/// assert!(doc.to_xml_string()?.contains("UNIT_ARCHER"));
/// # Ok::<(), civxml_dom::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    declaration: Option<Declaration>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create an empty document with no declaration.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            declaration: None,
        }
    }

    /// Create an empty document with a declaration.
    pub fn with_declaration(version: &str, encoding: Option<&str>) -> Self {
        let mut doc = Self::new();
        doc.declaration = Some(Declaration::new(version, encoding));
        doc
    }

    /// The XML declaration, if the document has one.
    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    /// Replace the XML declaration.
    pub fn set_declaration(&mut self, declaration: Option<Declaration>) {
        self.declaration = declaration;
    }

    // ---- node access -------------------------------------------------------

    #[inline]
    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).filter(|n| !n.removed)
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        match self.nodes.get_mut(id.index()) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(Error::InvalidNode(id)),
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    /// Whether the id refers to a node that has not been removed.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// The kind and payload of a node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    /// Whether the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.element_name().is_some())
    }

    /// The document node.
    #[inline]
    pub fn document_node(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    /// The root element (first element child of the document node).
    pub fn root_element(&self) -> Option<NodeId> {
        self.first_child_element(NodeId::DOCUMENT, None)
    }

    /// Element name.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::element_name)
    }

    /// Attributes of an element in source order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Value of an attribute.
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or add) an attribute on an element.
    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) -> Result<()> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(k, _)| k == key) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attributes.push((key.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(Error::InvalidNode(id)),
        }
    }

    /// Text of an element: its first child when that child is text or CDATA.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let first = self.get(id)?.first_child?;
        match &self.get(first)?.kind {
            NodeKind::Text(text) | NodeKind::CData(text) => Some(text),
            _ => None,
        }
    }

    /// Set the text of an element.
    ///
    /// Replaces the first child if it is text, otherwise inserts a new text
    /// node as the first child.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        let first = self.get_mut(id)?.first_child;
        if let Some(first) = first {
            if let NodeKind::Text(existing) | NodeKind::CData(existing) = &mut self.get_mut(first)?.kind {
                *existing = text.to_string();
                return Ok(());
            }
        }
        let node = self.push(NodeKind::Text(text.to_string()));
        self.insert_first_child(id, node)
    }

    /// Value of a text, CDATA or comment node.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.kind {
            NodeKind::Text(s) | NodeKind::CData(s) | NodeKind::Comment(s) => Some(s),
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Document => None,
        }
    }

    // ---- navigation --------------------------------------------------------

    /// Parent node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// First child of any kind.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child
    }

    /// Last child of any kind.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child
    }

    /// Next sibling of any kind.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling
    }

    /// Previous sibling of any kind.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling
    }

    fn matches(&self, id: NodeId, name: Option<&str>) -> bool {
        match self.name(id) {
            Some(actual) => name.map_or(true, |wanted| actual == wanted),
            None => false,
        }
    }

    /// First child element, optionally restricted to a name.
    pub fn first_child_element(&self, id: NodeId, name: Option<&str>) -> Option<NodeId> {
        let mut cursor = self.first_child(id);
        while let Some(child) = cursor {
            if self.matches(child, name) {
                return Some(child);
            }
            cursor = self.next_sibling(child);
        }
        None
    }

    /// Last child element, optionally restricted to a name.
    pub fn last_child_element(&self, id: NodeId, name: Option<&str>) -> Option<NodeId> {
        let mut cursor = self.last_child(id);
        while let Some(child) = cursor {
            if self.matches(child, name) {
                return Some(child);
            }
            cursor = self.previous_sibling(child);
        }
        None
    }

    /// Next sibling element, optionally restricted to a name.
    pub fn next_sibling_element(&self, id: NodeId, name: Option<&str>) -> Option<NodeId> {
        let mut cursor = self.next_sibling(id);
        while let Some(sibling) = cursor {
            if self.matches(sibling, name) {
                return Some(sibling);
            }
            cursor = self.next_sibling(sibling);
        }
        None
    }

    /// Previous sibling element, optionally restricted to a name.
    pub fn previous_sibling_element(&self, id: NodeId, name: Option<&str>) -> Option<NodeId> {
        let mut cursor = self.previous_sibling(id);
        while let Some(sibling) = cursor {
            if self.matches(sibling, name) {
                return Some(sibling);
            }
            cursor = self.previous_sibling(sibling);
        }
        None
    }

    /// Iterate over all children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over child elements, optionally restricted to a name.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        name: Option<&'a str>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |&child| self.matches(child, name))
    }

    /// Depth-first pre-order walk over a node's descendants (excluding itself).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == ancestor {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    // ---- mutation ----------------------------------------------------------

    /// Create a detached element. Attach it with one of the insert methods.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::element(name))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Create a detached CDATA node.
    pub fn create_cdata(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::CData(text.to_string()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    /// Unlink a node from its parent and siblings, keeping its subtree.
    fn detach(&mut self, id: NodeId) -> Result<()> {
        let (parent, prev, next) = {
            let node = self.get_mut(id)?;
            let links = (node.parent, node.prev_sibling, node.next_sibling);
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
            links
        };
        match prev {
            Some(prev) => self.get_mut(prev)?.next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.get_mut(parent)?.first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.get_mut(next)?.prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.get_mut(parent)?.last_child = prev;
                }
            }
        }
        Ok(())
    }

    fn check_move(&self, node: NodeId, target: NodeId) -> Result<()> {
        if node == NodeId::DOCUMENT || !self.contains(node) {
            return Err(Error::InvalidNode(node));
        }
        if !self.contains(target) {
            return Err(Error::InvalidNode(target));
        }
        if self.is_ancestor_or_self(node, target) {
            return Err(Error::InvalidMove { node, target });
        }
        Ok(())
    }

    /// Link a detached node between `prev` and `next` under `parent`.
    fn link(
        &mut self,
        parent: NodeId,
        prev: Option<NodeId>,
        next: Option<NodeId>,
        id: NodeId,
    ) -> Result<()> {
        {
            let node = self.get_mut(id)?;
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match prev {
            Some(prev) => self.get_mut(prev)?.next_sibling = Some(id),
            None => self.get_mut(parent)?.first_child = Some(id),
        }
        match next {
            Some(next) => self.get_mut(next)?.prev_sibling = Some(id),
            None => self.get_mut(parent)?.last_child = Some(id),
        }
        Ok(())
    }

    /// Append a node as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_move(child, parent)?;
        self.detach(child)?;
        let last = self.last_child(parent);
        self.link(parent, last, None, child)
    }

    /// Insert a node as the first child of `parent`, moving it if attached.
    pub fn insert_first_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_move(child, parent)?;
        self.detach(child)?;
        let first = self.first_child(parent);
        self.link(parent, None, first, child)
    }

    /// Insert a node immediately after `after`, moving it if attached.
    pub fn insert_after(&mut self, after: NodeId, child: NodeId) -> Result<()> {
        if after == child {
            return Ok(());
        }
        let parent = self.parent(after).ok_or(Error::InvalidNode(after))?;
        self.check_move(child, parent)?;
        self.detach(child)?;
        let next = self.next_sibling(after);
        self.link(parent, Some(after), next, child)
    }

    /// Insert a node immediately before `before`, moving it if attached.
    pub fn insert_before(&mut self, before: NodeId, child: NodeId) -> Result<()> {
        if before == child {
            return Ok(());
        }
        let parent = self.parent(before).ok_or(Error::InvalidNode(before))?;
        self.check_move(child, parent)?;
        self.detach(child)?;
        let prev = self.previous_sibling(before);
        self.link(parent, prev, Some(before), child)
    }

    /// Remove a node and its whole subtree.
    ///
    /// Removed nodes are marked, not freed: their ids stay invalid for the
    /// life of the document and the arena does not shrink until it is
    /// reloaded.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == NodeId::DOCUMENT {
            return Err(Error::InvalidNode(id));
        }
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            stack.extend(self.children(node));
            if let Some(n) = self.nodes.get_mut(node.index()) {
                n.removed = true;
            }
        }
        Ok(())
    }

    /// Remove every child element of a node. Returns how many were removed.
    pub fn remove_child_elements(&mut self, id: NodeId) -> Result<usize> {
        let children: Vec<NodeId> = self.child_elements(id, None).collect();
        for &child in &children {
            self.remove(child)?;
        }
        Ok(children.len())
    }

    /// Deep-copy a subtree, returning the detached copy.
    ///
    /// `keep` decides for every descendant element whether it (and its
    /// subtree) is copied.
    pub fn clone_subtree<F>(&mut self, id: NodeId, mut keep: F) -> Result<NodeId>
    where
        F: FnMut(&XmlDocument, NodeId) -> bool,
    {
        let kind = self.get(id).ok_or(Error::InvalidNode(id))?.kind.clone();
        let copy = self.push(kind);
        let mut stack = vec![(id, copy)];
        while let Some((source, target)) = stack.pop() {
            let children: Vec<NodeId> = self.children(source).collect();
            for child in children {
                if self.is_element(child) && !keep(self, child) {
                    continue;
                }
                let kind = self.get(child).ok_or(Error::InvalidNode(child))?.kind.clone();
                let child_copy = self.push(kind);
                let last = self.last_child(target);
                self.link(target, last, None, child_copy)?;
                stack.push((child, child_copy));
            }
        }
        Ok(copy)
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a XmlDocument,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Depth-first pre-order iterator over descendants.
pub struct Descendants<'a> {
    doc: &'a XmlDocument,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = match self.doc.first_child(current) {
            Some(child) => Some(child),
            None => {
                let mut cursor = Some(current);
                let mut found = None;
                while let Some(node) = cursor {
                    if node == self.root {
                        break;
                    }
                    if let Some(sibling) = self.doc.next_sibling(node) {
                        found = Some(sibling);
                        break;
                    }
                    cursor = self.doc.parent(node);
                }
                found
            }
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlDocument {
        XmlDocument::parse(
            "<Root><A>1</A><B>2</B><A>3</A><!-- note --><C><D>4</D></C></Root>",
        )
        .unwrap()
    }

    fn names(doc: &XmlDocument, parent: NodeId) -> Vec<String> {
        doc.child_elements(parent, None)
            .filter_map(|id| doc.name(id).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_navigation() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.name(root), Some("Root"));

        let a1 = doc.first_child_element(root, Some("A")).unwrap();
        let a2 = doc.next_sibling_element(a1, Some("A")).unwrap();
        assert_eq!(doc.text(a1), Some("1"));
        assert_eq!(doc.text(a2), Some("3"));
        assert_eq!(doc.next_sibling_element(a2, Some("A")), None);

        let last = doc.last_child_element(root, None).unwrap();
        assert_eq!(doc.name(last), Some("C"));
        assert_eq!(doc.previous_sibling_element(last, None), Some(a2));
        assert_eq!(doc.child_elements(root, Some("A")).count(), 2);
        assert_eq!(doc.children(root).count(), 5);
    }

    #[test]
    fn test_descendants_order() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let texts: Vec<&str> = doc
            .descendants(root)
            .filter_map(|id| match doc.kind(id) {
                Some(NodeKind::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_descendants_stay_inside_subtree() {
        let doc = sample();
        let root = doc.root_element().unwrap();
        let a1 = doc.first_child_element(root, Some("A")).unwrap();
        assert_eq!(doc.descendants(a1).count(), 1);
    }

    #[test]
    fn test_set_text_creates_and_replaces() {
        let mut doc = XmlDocument::parse("<Root><A/></Root>").unwrap();
        let root = doc.root_element().unwrap();
        let a = doc.first_child_element(root, Some("A")).unwrap();
        assert_eq!(doc.text(a), None);

        doc.set_text(a, "x").unwrap();
        assert_eq!(doc.text(a), Some("x"));
        doc.set_text(a, "y").unwrap();
        assert_eq!(doc.text(a), Some("y"));
        assert_eq!(doc.children(a).count(), 1);
    }

    #[test]
    fn test_insert_and_move() {
        let mut doc = sample();
        let root = doc.root_element().unwrap();
        let c = doc.first_child_element(root, Some("C")).unwrap();
        let b = doc.first_child_element(root, Some("B")).unwrap();

        doc.insert_before(b, c).unwrap();
        assert_eq!(names(&doc, root), vec!["A", "C", "B", "A"]);

        let e = doc.create_element("E");
        doc.insert_first_child(root, e).unwrap();
        assert_eq!(names(&doc, root), vec!["E", "A", "C", "B", "A"]);

        let a = doc.first_child_element(root, Some("A")).unwrap();
        doc.append_child(root, a).unwrap();
        assert_eq!(names(&doc, root), vec!["E", "C", "B", "A", "A"]);

        doc.insert_after(e, b).unwrap();
        assert_eq!(names(&doc, root), vec!["E", "B", "C", "A", "A"]);
    }

    #[test]
    fn test_move_into_descendant_rejected() {
        let mut doc = sample();
        let root = doc.root_element().unwrap();
        let c = doc.first_child_element(root, Some("C")).unwrap();
        let d = doc.first_child_element(c, Some("D")).unwrap();
        assert!(matches!(doc.append_child(d, c), Err(Error::InvalidMove { .. })));
    }

    #[test]
    fn test_remove_tombstones_subtree() {
        let mut doc = sample();
        let root = doc.root_element().unwrap();
        let c = doc.first_child_element(root, Some("C")).unwrap();
        let d = doc.first_child_element(c, Some("D")).unwrap();

        doc.remove(c).unwrap();
        assert!(!doc.contains(c));
        assert!(!doc.contains(d));
        assert_eq!(doc.name(d), None);
        assert_eq!(names(&doc, root), vec!["A", "B", "A"]);
        assert!(matches!(doc.remove(c), Err(Error::InvalidNode(_))));

        // Fresh nodes never reuse a removed id.
        let e = doc.create_element("E");
        assert_ne!(e, c);
        assert_ne!(e, d);
    }

    #[test]
    fn test_remove_child_elements_keeps_text() {
        let mut doc = XmlDocument::parse("<Root>text<A/><B/></Root>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.remove_child_elements(root).unwrap(), 2);
        assert_eq!(doc.text(root), Some("text"));
        assert_eq!(doc.child_elements(root, None).count(), 0);
    }

    #[test]
    fn test_clone_subtree_filtered() {
        let mut doc = XmlDocument::parse(
            "<Root><Unit><Type>UNIT_A</Type><Cost>10</Cost></Unit></Root>",
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let unit = doc.first_child_element(root, Some("Unit")).unwrap();

        let copy = doc
            .clone_subtree(unit, |doc, id| doc.name(id) != Some("Type"))
            .unwrap();
        doc.insert_after(unit, copy).unwrap();

        assert_eq!(doc.child_elements(root, Some("Unit")).count(), 2);
        assert_eq!(doc.first_child_element(copy, Some("Type")), None);
        let cost = doc.first_child_element(copy, Some("Cost")).unwrap();
        assert_eq!(doc.text(cost), Some("10"));
    }

    #[test]
    fn test_attributes() {
        let mut doc = XmlDocument::parse(r#"<Root xmlns="x-schema:Foo.xml"/>"#).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.attribute(root, "xmlns"), Some("x-schema:Foo.xml"));
        doc.set_attribute(root, "xmlns", "x-schema:Bar.xml").unwrap();
        doc.set_attribute(root, "id", "1").unwrap();
        assert_eq!(doc.attribute(root, "xmlns"), Some("x-schema:Bar.xml"));
        assert_eq!(doc.attributes(root).len(), 2);
    }
}
