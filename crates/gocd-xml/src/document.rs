//! Arena-backed XML document tree.
//!
//! One [`Document`] owns every node; [`Node`] handles are cheap views keyed
//! by [`NodeId`]. A mutation made through any handle is immediately visible
//! through every other handle onto the same document. The document is
//! deliberately single-threaded: one configuration session owns one tree.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::canonical;
use crate::error::Result;
use crate::maybe::MaybeNode;

/// Index of a node within its owning document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) tag: String,
    /// Attribute keys are unique; the canonical serializer sorts them.
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) text: Option<String>,
    pub(crate) children: Vec<NodeId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Document {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) root: NodeId,
}

impl Document {
    pub(crate) fn alloc(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }
}

/// Shared handle to one exclusively-owned document.
#[derive(Clone)]
pub struct Doc {
    inner: Rc<RefCell<Document>>,
}

impl Doc {
    /// Create a document holding a single empty root element.
    pub fn with_root(tag: &str) -> Doc {
        let root = NodeData::new(tag);
        Doc {
            inner: Rc::new(RefCell::new(Document {
                nodes: vec![root],
                root: NodeId(0),
            })),
        }
    }

    /// Parse a document from its serialized text.
    pub fn parse(input: &str) -> Result<Doc> {
        crate::parse::parse(input)
    }

    pub fn root(&self) -> Node {
        let id = self.inner.borrow().root;
        Node {
            doc: self.clone(),
            id,
        }
    }

    /// Canonical serialization of the whole document, including the fixed
    /// XML declaration. Deterministic: two calls over an unmodified tree
    /// yield byte-identical output.
    pub fn to_xml(&self) -> String {
        canonical::document_to_string(&self.inner.borrow())
    }

    pub(crate) fn borrow(&self) -> std::cell::Ref<'_, Document> {
        self.inner.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> std::cell::RefMut<'_, Document> {
        self.inner.borrow_mut()
    }
}

impl fmt::Debug for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Doc")
            .field("root", &self.inner.borrow().node(self.inner.borrow().root).tag)
            .finish()
    }
}

/// View onto one node of a shared document.
#[derive(Clone)]
pub struct Node {
    pub(crate) doc: Doc,
    pub(crate) id: NodeId,
}

impl Node {
    pub(crate) fn new(doc: Doc, id: NodeId) -> Node {
        Node { doc, id }
    }

    pub fn tag(&self) -> String {
        self.doc.borrow().node(self.id).tag.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.doc
            .borrow()
            .node(self.id)
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute, replacing the value when the key already exists.
    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut doc = self.doc.borrow_mut();
        let attributes = &mut doc.node_mut(self.id).attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(self.id).attributes.retain(|(key, _)| key != name);
    }

    pub fn text(&self) -> Option<String> {
        self.doc.borrow().node(self.id).text.clone()
    }

    pub fn set_text(&self, value: &str) {
        self.doc.borrow_mut().node_mut(self.id).text = Some(value.to_string());
    }

    pub fn children(&self) -> Vec<Node> {
        let ids = self.doc.borrow().node(self.id).children.clone();
        ids.into_iter()
            .map(|id| Node::new(self.doc.clone(), id))
            .collect()
    }

    pub fn children_with_tag(&self, tag: &str) -> Vec<Node> {
        self.children()
            .into_iter()
            .filter(|child| child.tag() == tag)
            .collect()
    }

    /// First child with the given tag.
    pub fn find(&self, tag: &str) -> Option<Node> {
        self.children_with_tag(tag).into_iter().next()
    }

    /// Null-safe reader over this node.
    pub fn maybe(&self) -> MaybeNode {
        MaybeNode::from(Some(self.clone()))
    }

    /// Append a new empty child element and return it.
    pub fn append_new_child(&self, tag: &str) -> Node {
        let id = {
            let mut doc = self.doc.borrow_mut();
            let id = doc.alloc(tag);
            doc.node_mut(self.id).children.push(id);
            id
        };
        Node::new(self.doc.clone(), id)
    }

    /// Detach a direct child. Does nothing when `child` is not ours.
    pub fn remove_child(&self, child: &Node) {
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(self.id).children.retain(|id| *id != child.id);
    }

    /// Re-attach an already-allocated node of the same document at the end
    /// of our child list. Used to rewrite a child sequence in a new order.
    pub fn append_child_node(&self, child: &Node) {
        debug_assert!(Rc::ptr_eq(&self.doc.inner, &child.doc.inner));
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(self.id).children.push(child.id);
    }

    /// Detach every child with `tag` (relative order preserved) and
    /// re-append the run at the end of the child list.
    pub fn move_children_to_end(&self, tag: &str) {
        let mut doc = self.doc.borrow_mut();
        let matches: Vec<NodeId> = doc
            .node(self.id)
            .children
            .iter()
            .copied()
            .filter(|id| doc.node(*id).tag == tag)
            .collect();
        let children = &mut doc.node_mut(self.id).children;
        children.retain(|id| !matches.contains(id));
        children.extend(matches);
    }

    /// Handle identity: same document and same arena slot.
    pub fn same_node(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.doc.inner, &other.doc.inner) && self.id == other.id
    }

    /// Canonical serialization of this subtree.
    pub fn to_xml(&self) -> String {
        canonical::node_to_string(&self.doc.borrow(), self.id)
    }

    // ---- idempotent ensure primitives ------------------------------------

    /// First existing child with `tag`, or a freshly appended empty one.
    pub fn ensure_child(&self, tag: &str) -> Node {
        match self.find(tag) {
            Some(child) => child,
            None => self.append_new_child(tag),
        }
    }

    /// First child with `tag` whose `key` attribute equals `value`, or a
    /// freshly appended one carrying that attribute. Never duplicates a key.
    pub fn ensure_child_with_attribute(&self, tag: &str, key: &str, value: &str) -> Node {
        for child in self.children_with_tag(tag) {
            if child.attribute(key).as_deref() == Some(value) {
                return child;
            }
        }
        let child = self.append_new_child(tag);
        child.set_attribute(key, value);
        child
    }

    /// First child with `tag` whose text equals `text`, or a freshly
    /// appended one with that text.
    pub fn ensure_child_with_text(&self, tag: &str, text: &str) -> Node {
        for child in self.children_with_tag(tag) {
            if child.text().as_deref() == Some(text) {
                return child;
            }
        }
        let child = self.append_new_child(tag);
        child.set_text(text);
        child
    }

    /// First child with `tag` whose nested `child_tag` text equals
    /// `child_text`, or a freshly appended one carrying that descendant.
    /// Used for keyed configuration properties.
    pub fn ensure_child_with_descendant(
        &self,
        tag: &str,
        child_tag: &str,
        child_text: &str,
    ) -> Node {
        for child in self.children_with_tag(tag) {
            let value = child.maybe().child(child_tag).text();
            if value.as_deref() == Some(child_text) {
                return child;
            }
        }
        let child = self.append_new_child(tag);
        child.append_new_child(child_tag).set_text(child_text);
        child
    }
}

/// Equality is structural: two nodes are equal when their canonical
/// serialized subtrees are identical, never by handle identity.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.to_xml() == other.to_xml()
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(<{}>)", self.tag())
    }
}
