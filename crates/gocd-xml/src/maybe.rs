//! Null-safe reading over a possibly-absent node.
//!
//! Every accessor degrades to an empty result instead of failing, so
//! higher layers can read optional structure without absence checks.

use crate::document::Node;

/// A possibly-absent node. Reads degrade to empty results; removals on an
/// absent node are no-ops.
#[derive(Clone, Debug)]
pub struct MaybeNode(Option<Node>);

impl MaybeNode {
    pub fn from(node: Option<Node>) -> MaybeNode {
        MaybeNode(node)
    }

    pub fn none() -> MaybeNode {
        MaybeNode(None)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// First child with `tag`, staying null-safe when absent.
    pub fn child(&self, tag: &str) -> MaybeNode {
        MaybeNode(self.0.as_ref().and_then(|node| node.find(tag)))
    }

    /// All children with `tag`; empty when absent.
    pub fn children(&self, tag: &str) -> Vec<Node> {
        self.0
            .as_ref()
            .map(|node| node.children_with_tag(tag))
            .unwrap_or_default()
    }

    /// All children regardless of tag; empty when absent.
    pub fn all_children(&self) -> Vec<Node> {
        self.0
            .as_ref()
            .map(Node::children)
            .unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.as_ref().and_then(|node| node.attribute(name))
    }

    pub fn text(&self) -> Option<String> {
        self.0.as_ref().and_then(Node::text)
    }

    pub fn has_attribute_value(&self, name: &str, value: &str) -> bool {
        self.attribute(name).as_deref() == Some(value)
    }

    /// Remove every child, or only those with `tag` when given.
    pub fn remove_all_children(&self, tag: Option<&str>) -> &MaybeNode {
        if let Some(node) = &self.0 {
            for child in node.children() {
                if tag.is_none() || tag == Some(child.tag().as_str()) {
                    node.remove_child(&child);
                }
            }
        }
        self
    }

    pub fn remove_attribute(&self, name: &str) -> &MaybeNode {
        if let Some(node) = &self.0 {
            node.remove_attribute(name);
        }
        self
    }
}
