use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed xml: {0}")]
    Parse(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("bad escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("document is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("document has no root element")]
    NoRoot,
    #[error("unexpected content after the root element")]
    TrailingContent,
    #[error("unbalanced closing tag </{0}>")]
    UnbalancedTag(String),
}

pub type Result<T> = std::result::Result<T, XmlError>;
