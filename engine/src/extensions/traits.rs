//! Processor SPI: the contract between the engine and configured
//! dialects. The engine consumes these as opaque trait objects; resolver
//! and processor implementations live outside the core.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dom::{Document, NodeId};
use crate::error::EngineError;
use crate::processing::Context;
use crate::value::Value;

/// Match context that selected a processor for a node, e.g. which
/// normalized tag or attribute name it matched.
#[derive(Debug, Clone, Default)]
pub struct ProcessorMatch {
    pub matched_name: Option<String>,
}

impl ProcessorMatch {
    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            matched_name: Some(name.into()),
        }
    }
}

/// A transformation rule applied to a node during processing.
///
/// Processors may mutate the node's tree position as a side effect:
/// detaching the node is the sanctioned way to stop its further
/// processing, and setting the node's recompute flags forces the binding
/// list to be re-resolved mid-dispatch.
pub trait Processor: Send + Sync {
    fn execute(
        &self,
        ctx: &Context,
        matched: &ProcessorMatch,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<ProcessorResult, EngineError>;
}

/// Outcome of a single processor execution. May carry new or updated
/// context variables for the rest of the dispatch cycle.
#[derive(Debug, Clone, Default)]
pub struct ProcessorResult {
    variables: Option<HashMap<String, Value>>,
}

impl ProcessorResult {
    pub fn ok() -> Self {
        Self { variables: None }
    }

    pub fn with_variables(variables: HashMap<String, Value>) -> Self {
        Self {
            variables: Some(variables),
        }
    }

    pub fn has_variables(&self) -> bool {
        self.variables
            .as_ref()
            .is_some_and(|vars| !vars.is_empty())
    }

    /// Compute the context for the next execution in the dispatch cycle.
    pub fn merge_into(&self, ctx: &Context) -> Context {
        match &self.variables {
            Some(vars) if !vars.is_empty() => ctx.derive_with(vars.clone()),
            _ => ctx.clone(),
        }
    }
}

/// An immutable pairing of a processor with the match context that
/// selected it. Deduplication during dispatch is by identity (the `Arc`
/// pointer), never by structural equality: the same configured instance
/// must not run twice within one dispatch cycle.
pub struct ProcessorBinding {
    pub processor: Arc<dyn Processor>,
    pub matched: ProcessorMatch,
}

impl ProcessorBinding {
    pub fn new(processor: Arc<dyn Processor>, matched: ProcessorMatch) -> Arc<Self> {
        Arc::new(Self { processor, matched })
    }
}

impl fmt::Debug for ProcessorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorBinding")
            .field("matched", &self.matched)
            .finish_non_exhaustive()
    }
}

/// Decides which processors are configured for a node.
///
/// Must be deterministic for a given configuration state and tolerate
/// repeated calls (resolution runs again after structural changes).
pub trait ProcessorResolver: Send + Sync {
    fn resolve_processors(
        &self,
        doc: &Document,
        node: NodeId,
    ) -> Result<Vec<Arc<ProcessorBinding>>, EngineError>;
}
