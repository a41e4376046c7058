//! Document parsing via the quick-xml pull reader.
//!
//! Comments, processing instructions and whitespace-only text are dropped;
//! the canonical serializer reintroduces formatting deterministically.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::document::{Doc, NodeId};
use crate::error::{Result, XmlError};

pub(crate) fn parse(input: &str) -> Result<Doc> {
    let mut reader = Reader::from_str(input);
    let mut doc: Option<Doc> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let id = open_element(&mut doc, &mut stack, &start)?;
                stack.push(id);
            }
            Event::Empty(start) => {
                open_element(&mut doc, &mut stack, &start)?;
            }
            Event::End(end) => {
                let tag = std::str::from_utf8(end.name().as_ref())?.to_string();
                if stack.pop().is_none() {
                    return Err(XmlError::UnbalancedTag(tag));
                }
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(text.as_ref())?;
                if raw.trim().is_empty() {
                    continue;
                }
                let unescaped = unescape(raw)?;
                match (&doc, stack.last()) {
                    (Some(doc), Some(id)) => {
                        doc.borrow_mut().node_mut(*id).text = Some(unescaped.into_owned());
                    }
                    _ => return Err(XmlError::TrailingContent),
                }
            }
            Event::CData(data) => {
                let raw = std::str::from_utf8(data.as_ref())?;
                match (&doc, stack.last()) {
                    (Some(doc), Some(id)) => {
                        doc.borrow_mut().node_mut(*id).text = Some(raw.to_string());
                    }
                    _ => return Err(XmlError::TrailingContent),
                }
            }
            Event::Eof => break,
            // Declarations, comments and processing instructions carry no
            // configuration content.
            _ => {}
        }
    }

    doc.ok_or(XmlError::NoRoot)
}

/// Allocate the element described by `start`, attach it to the open parent
/// (or install it as the root) and return its id.
fn open_element(
    doc: &mut Option<Doc>,
    stack: &mut [NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let tag = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = unescape(std::str::from_utf8(&attribute.value)?)?.into_owned();
        attributes.push((key, value));
    }

    match (doc.as_ref(), stack.last()) {
        (Some(doc), Some(parent)) => {
            let mut inner = doc.borrow_mut();
            let id = inner.alloc(&tag);
            inner.node_mut(id).attributes = attributes;
            inner.node_mut(*parent).children.push(id);
            Ok(id)
        }
        (Some(_), None) => Err(XmlError::TrailingContent),
        (None, _) => {
            let fresh = Doc::with_root(&tag);
            let root = fresh.root();
            for (key, value) in &attributes {
                root.set_attribute(key, value);
            }
            let id = {
                let inner = fresh.borrow();
                inner.root
            };
            *doc = Some(fresh);
            Ok(id)
        }
    }
}
