//! Core node-tree processing engine for document templates.
//!
//! Walks a parsed document tree, resolves which processors apply to each
//! node, dispatches them while threading a scoped variable context, and
//! evaluates the typed expressions those processors use to make decisions.

pub mod cache;
pub mod dom;
pub mod error;
pub mod expression;
pub mod extensions;
pub mod processing;
pub mod value;

use std::collections::HashMap;
use std::sync::Arc;

pub use cache::{NameCache, SharedNameCache};
pub use dom::{Document, ExternalNode, Node, NodeId, NodeKind, translate};
pub use error::EngineError;
pub use expression::{Expression, evaluate};
pub use extensions::{
    Processor, ProcessorBinding, ProcessorMatch, ProcessorResolver, ProcessorResult,
};
pub use processing::Context;
pub use value::Value;

/// Process a document against a resolver and a set of execution-scoped
/// variables.
pub fn process_document(
    doc: &mut Document,
    resolver: Arc<dyn ProcessorResolver>,
    variables: HashMap<String, Value>,
) -> Result<(), EngineError> {
    let ctx = Context::with_variables(resolver, variables);
    doc.process_document(&ctx)
}
