//! Document model: node kinds, the owning arena, and the external
//! representation adapter.

pub mod adapter;
pub mod document;
pub mod node;

pub use adapter::{ExternalNode, translate};
pub use document::Document;
pub use node::{Attribute, Element, Node, NodeId, NodeKind, apply_dialect_prefix};
