//! Document: owner of the node arena and every structural operation that
//! maintains the parent/child back-reference invariant.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::SharedNameCache;
use crate::dom::node::{Element, Node, NodeId, NodeKind};
use crate::error::EngineError;

/// The processed document tree. Owns every node; all other references to
/// nodes are non-owning [`NodeId`] handles.
///
/// Only the structural data is serialized; a reloaded document is
/// freshly resolved when it is next processed.
#[derive(Serialize, Deserialize)]
pub struct Document {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) root: NodeId,
    #[serde(skip)]
    pub(crate) name_cache: SharedNameCache,
}

impl Document {
    pub fn new(name_cache: SharedNameCache) -> Self {
        let root = Uuid::new_v4();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node::new(NodeKind::Root {
                children: Vec::new(),
            }),
        );
        Self {
            nodes,
            root,
            name_cache,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name_cache(&self) -> &SharedNameCache {
        &self.name_cache
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node, EngineError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| EngineError::invalid_argument(format!("Node not found: {}", id)))
    }

    pub(crate) fn node_mut_ref(&mut self, id: NodeId) -> Result<&mut Node, EngineError> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| EngineError::invalid_argument(format!("Node not found: {}", id)))
    }

    /// Create a detached element node; the tag name is normalized through
    /// the shared name cache.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let element = Element::new(&self.name_cache, name);
        self.insert_node(Node::new(NodeKind::Element(element)))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.insert_node(Node::new(NodeKind::Text {
            content: content.to_string(),
        }))
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.insert_node(Node::new(NodeKind::Comment {
            content: content.to_string(),
        }))
    }

    pub fn create_data_section(&mut self, content: &str) -> NodeId {
        self.insert_node(Node::new(NodeKind::DataSection {
            content: content.to_string(),
        }))
    }

    fn insert_node(&mut self, node: Node) -> NodeId {
        let id = Uuid::new_v4();
        self.nodes.insert(id, node);
        id
    }

    /// Append a detached node as the last child of a container.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), EngineError> {
        let index = self
            .node_ref(parent)?
            .kind
            .children()
            .map(|c| c.len())
            .unwrap_or(0);
        self.insert_child(parent, index, child)
    }

    /// Insert a detached node at `index` among a container's children.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), EngineError> {
        if self.node_ref(child)?.parent.is_some() {
            return Err(EngineError::invalid_argument(format!(
                "Node {} is already attached; detach it first",
                child
            )));
        }
        let parent_node = self.node_mut_ref(parent)?;
        let Some(children) = parent_node.kind.children_mut() else {
            return Err(EngineError::invalid_argument(format!(
                "Node {} is not a container",
                parent
            )));
        };
        if index > children.len() {
            return Err(EngineError::invalid_argument(format!(
                "Child index {} out of bounds ({} children)",
                index,
                children.len()
            )));
        }
        children.insert(index, child);
        self.node_mut_ref(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent. The subtree below it stays intact.
    /// Detaching an already-detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(children) = self
            .nodes
            .get_mut(&parent)
            .and_then(|n| n.kind.children_mut())
        {
            children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
    }

    /// Snapshot of a node's child list; empty for leaves.
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .and_then(|n| n.kind.children())
            .cloned()
            .unwrap_or_default()
    }

    /// Position of a node among its parent's children, if attached.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes
            .get(&parent)?
            .kind
            .children()?
            .iter()
            .position(|c| *c == id)
    }

    /// Set an attribute on an element node through the shared name cache.
    ///
    /// Attribute edits can change which processors apply; callers that
    /// need re-resolution set the node's recompute flags.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), EngineError> {
        let cache = self.name_cache.clone();
        let node = self.node_mut_ref(id)?;
        let Some(element) = node.as_element_mut() else {
            return Err(EngineError::invalid_argument(format!(
                "Node {} is not an element",
                id
            )));
        };
        element.set_attribute(&cache, name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, EngineError> {
        let cache = self.name_cache.clone();
        let node = self.node_mut_ref(id)?;
        let Some(element) = node.as_element_mut() else {
            return Err(EngineError::invalid_argument(format!(
                "Node {} is not an element",
                id
            )));
        };
        Ok(element.remove_attribute(&cache, name))
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)?
            .as_element()?
            .attribute(&self.name_cache, name)
    }

    /// Clone a node (and, for containers, its whole subtree) into this
    /// arena.
    ///
    /// The clone's local-variable overlay is always deep-copied. With
    /// `clone_processor_state` the binding list is shared by reference and
    /// the skippable/precomputed flags are copied verbatim; without it the
    /// clone starts unresolved and will be freshly precomputed wherever it
    /// is attached.
    pub fn clone_node(
        &mut self,
        source: NodeId,
        new_parent: Option<NodeId>,
        clone_processor_state: bool,
    ) -> Result<NodeId, EngineError> {
        let clone = self.clone_subtree(source, clone_processor_state)?;
        if let Some(parent) = new_parent {
            self.append_child(parent, clone)?;
        }
        Ok(clone)
    }

    fn clone_subtree(
        &mut self,
        source: NodeId,
        clone_processor_state: bool,
    ) -> Result<NodeId, EngineError> {
        let source_node = self.node_ref(source)?;
        let kind_template = source_node.kind.clone();
        let local_variables = source_node.local_variables.clone();
        let bindings = source_node.bindings.clone();
        let skippable = source_node.skippable;
        let precomputed = source_node.precomputed;

        // Kind-specific duplication: containers get their child list
        // rebuilt from recursively cloned children.
        let kind = match kind_template {
            NodeKind::Root { children } => {
                let cloned = self.clone_children(&children, clone_processor_state)?;
                NodeKind::Root { children: cloned }
            }
            NodeKind::Element(mut element) => {
                let children = std::mem::take(&mut element.children);
                element.children = self.clone_children(&children, clone_processor_state)?;
                NodeKind::Element(element)
            }
            leaf => leaf,
        };

        let mut clone = Node::new(kind);
        clone.local_variables = local_variables;
        if clone_processor_state {
            clone.bindings = bindings;
            clone.skippable = skippable;
            clone.precomputed = precomputed;
        }
        let id = self.insert_node(clone);
        if let Some(children) = self.nodes.get(&id).and_then(|n| n.kind.children()).cloned() {
            for child in children {
                self.node_mut_ref(child)?.parent = Some(id);
            }
        }
        Ok(id)
    }

    fn clone_children(
        &mut self,
        children: &[NodeId],
        clone_processor_state: bool,
    ) -> Result<Vec<NodeId>, EngineError> {
        let mut cloned = Vec::with_capacity(children.len());
        for child in children {
            cloned.push(self.clone_subtree(*child, clone_processor_state)?);
        }
        Ok(cloned)
    }
}
