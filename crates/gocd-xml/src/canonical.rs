//! Canonical serialization.
//!
//! The canonical form is the comparison key for change detection and the
//! body posted back to the server, so it must be deterministic down to the
//! byte: fixed declaration, two-space indentation, attributes sorted by
//! name, text-only elements rendered inline, empty elements self-closed.

use quick_xml::escape::{escape, partial_escape};

use crate::document::{Document, NodeId};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";

pub(crate) fn document_to_string(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(DECLARATION);
    out.push('\n');
    write_node(doc, doc.root, 0, &mut out);
    out
}

pub(crate) fn node_to_string(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, 0, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, depth: usize, out: &mut String) {
    let node = doc.node(id);
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push('<');
    out.push_str(&node.tag);
    // writing order is independent of the order attributes were set in
    let mut attributes: Vec<&(String, String)> = node.attributes.iter().collect();
    attributes.sort_by(|left, right| left.0.cmp(&right.0));
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    let text = node.text.as_deref().unwrap_or("");
    if text.is_empty() && node.children.is_empty() {
        out.push_str(" />\n");
        return;
    }

    out.push('>');
    if !text.is_empty() {
        out.push_str(&partial_escape(text));
    }
    if node.children.is_empty() {
        out.push_str("</");
        out.push_str(&node.tag);
        out.push_str(">\n");
        return;
    }

    out.push('\n');
    for child in &node.children {
        write_node(doc, *child, depth + 1, out);
    }
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push_str(">\n");
}
