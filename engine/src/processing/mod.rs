//! Node precomputation and the processor dispatch loop.
//!
//! Processing is depth-first and single-threaded per execution: each node
//! lazily resolves its processor bindings, decides whether it can be
//! skipped, derives an extended context from its local variables, then
//! dispatches its bindings one at a time. A processor may mutate the tree
//! being walked; the loop re-reads the binding list after every execution
//! that requests recomputation.

pub mod context;

pub use context::Context;

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, trace};

use crate::dom::Document;
use crate::dom::node::NodeId;
use crate::error::EngineError;
use crate::extensions::{ProcessorBinding, ProcessorResolver};

/// Identity of a binding for within-call dedupe: the same configured
/// instance must not run twice in one dispatch cycle.
fn binding_identity(binding: &Arc<ProcessorBinding>) -> usize {
    Arc::as_ptr(binding) as usize
}

impl Document {
    /// Process the whole document depth-first from the root.
    pub fn process_document(&mut self, ctx: &Context) -> Result<(), EngineError> {
        debug!("Processing document from root {}", self.root);
        self.process(self.root, ctx)
    }

    /// Resolve and cache the processors applicable to a node.
    ///
    /// Idempotent per structural state. The kind-specific hook runs on
    /// every call, so containers keep their children precomputed even
    /// when their own state is already resolved.
    pub fn precompute(
        &mut self,
        id: NodeId,
        resolver: &dyn ProcessorResolver,
    ) -> Result<(), EngineError> {
        if !self.node_ref(id)?.is_precomputed() {
            let bindings = resolver.resolve_processors(self, id)?;
            if bindings.is_empty() {
                // Only this node: children are precomputed right below,
                // and any child that needs processing reopens the
                // ancestor chain on its own.
                let node = self.node_mut_ref(id)?;
                node.bindings = bindings;
                node.skippable = true;
            } else {
                trace!("Node {} resolved {} processor(s)", id, bindings.len());
                self.node_mut_ref(id)?.bindings = bindings;
                self.set_skippable(id, false);
            }
            self.node_mut_ref(id)?.precomputed = true;
        }

        self.do_additional_precompute(id, resolver)
    }

    fn do_additional_precompute(
        &mut self,
        id: NodeId,
        resolver: &dyn ProcessorResolver,
    ) -> Result<(), EngineError> {
        for child in self.child_ids(id) {
            self.precompute(child, resolver)?;
        }
        Ok(())
    }

    /// Set a node's skippable flag.
    ///
    /// Setting `false` reopens the whole ancestor chain, stopping at the
    /// first already-open ancestor; setting `true` is strictly local.
    pub fn set_skippable(&mut self, id: NodeId, skippable: bool) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.skippable = skippable;
        if skippable {
            return;
        }
        let mut current = node.parent;
        while let Some(ancestor_id) = current {
            let Some(ancestor) = self.nodes.get_mut(&ancestor_id) else {
                break;
            };
            if !ancestor.skippable {
                break;
            }
            ancestor.skippable = false;
            current = ancestor.parent;
        }
    }

    /// Apply the node's processors and recurse into its children.
    ///
    /// A processor failure propagates immediately; side effects of
    /// earlier bindings in the same cycle stay applied. A processor
    /// detaching the node stops its dispatch loop without error.
    pub fn process(&mut self, id: NodeId, ctx: &Context) -> Result<(), EngineError> {
        let resolver = Arc::clone(ctx.resolver());

        if !self.node_ref(id)?.is_precomputed() {
            self.precompute(id, resolver.as_ref())?;
        }
        if self.needs_recompute(id)? {
            self.force_precompute(id, resolver.as_ref())?;
        }

        if self.node_ref(id)?.is_skippable() {
            trace!("Skipping node {}", id);
            return Ok(());
        }

        // Node-local variables extend the ambient context; the scope that
        // was actually applied is written back so the node's cached view
        // stays consistent (later cloning depends on it).
        let node = self.node_ref(id)?;
        let mut execution_ctx = match node.local_variables() {
            Some(vars) if !vars.is_empty() => ctx.derive_with(vars.clone()),
            _ => ctx.clone(),
        };
        if execution_ctx.has_local_variables() {
            self.node_mut_ref(id)?
                .set_local_variables(Some(execution_ctx.local_variables().clone()));
        }

        if self.node_ref(id)?.has_parent() && !self.node_ref(id)?.bindings().is_empty() {
            let mut already_executed: HashSet<usize> = HashSet::new();

            // Executing one binding at a time allows processors to make
            // updates that change which processors apply (for example by
            // adding or removing attributes).
            while self.node_ref(id)?.has_parent() {
                let Some(binding) = self.next_binding(id, &already_executed)? else {
                    break;
                };
                debug!(
                    "Executing processor (matched: {:?}) on node {}",
                    binding.matched.matched_name, id
                );

                let result = binding
                    .processor
                    .execute(&execution_ctx, &binding.matched, self, id)?;
                let next_ctx = result.merge_into(&execution_ctx);
                if result.has_variables() {
                    self.node_mut_ref(id)?
                        .set_local_variables(Some(next_ctx.local_variables().clone()));
                }
                execution_ctx = next_ctx;
                already_executed.insert(binding_identity(&binding));

                if self.needs_recompute(id)? {
                    self.force_precompute(id, resolver.as_ref())?;
                }
            }
        }

        self.do_additional_process(id, &execution_ctx)
    }

    fn do_additional_process(&mut self, id: NodeId, ctx: &Context) -> Result<(), EngineError> {
        if !self.node_ref(id)?.kind().is_container() {
            return Ok(());
        }
        // Snapshot: processors may restructure the child list while it is
        // being walked. Only children still owned here are processed.
        for child in self.child_ids(id) {
            if self.get_node(child).and_then(|n| n.parent()) == Some(id) {
                self.process(child, ctx)?;
            }
        }
        Ok(())
    }

    fn next_binding(
        &self,
        id: NodeId,
        already_executed: &HashSet<usize>,
    ) -> Result<Option<Arc<ProcessorBinding>>, EngineError> {
        Ok(self
            .node_ref(id)?
            .bindings()
            .iter()
            .find(|b| !already_executed.contains(&binding_identity(b)))
            .cloned())
    }

    fn needs_recompute(&self, id: NodeId) -> Result<bool, EngineError> {
        let node = self.node_ref(id)?;
        Ok(node.recompute_immediately() || node.recompute_after_each_execution())
    }

    /// Re-resolve the binding list against the current tree state. Only
    /// the one-shot `recompute_immediately` flag is cleared;
    /// `recompute_after_each_execution` persists across cycles.
    fn force_precompute(
        &mut self,
        id: NodeId,
        resolver: &dyn ProcessorResolver,
    ) -> Result<(), EngineError> {
        self.node_mut_ref(id)?.precomputed = false;
        self.precompute(id, resolver)?;
        self.node_mut_ref(id)?.recompute_immediately = false;
        Ok(())
    }
}
