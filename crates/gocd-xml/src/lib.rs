//! Arena-backed XML document tree for pipeline configuration.
//!
//! Higher layers route every tree access through two kinds of primitive:
//! the idempotent `ensure_child*` family on [`Node`] (find matching child
//! by key, or create it) and the null-safe [`MaybeNode`] reader, so absence
//! never faults and repeated construction never duplicates structure.

mod canonical;
mod document;
mod error;
mod maybe;
mod parse;

pub use document::{Doc, Node, NodeId};
pub use error::{Result, XmlError};
pub use maybe::MaybeNode;
