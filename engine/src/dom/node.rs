//! Node model: the closed set of document node kinds plus the runtime
//! processing state attached to every node.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::NameCache;
use crate::extensions::ProcessorBinding;
use crate::value::Value;

/// Non-owning handle to a node inside a [`Document`](super::Document) arena.
pub type NodeId = Uuid;

/// Prefix a name with a dialect prefix (`"th"` + `"text"` -> `"th:text"`).
/// A blank prefix leaves the name untouched.
pub fn apply_dialect_prefix(name: &str, dialect_prefix: &str) -> String {
    if dialect_prefix.trim().is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", dialect_prefix, name)
    }
}

/// A single element attribute. The normalized name is the lookup key;
/// the original spelling is kept for serialization fidelity elsewhere.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Attribute {
    pub name: String,
    pub original_name: String,
    pub value: String,
}

/// Payload of an element (tag) node: a Tree Container with attributes.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Element {
    pub name: String,
    pub original_name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
}

impl Element {
    pub fn new(cache: &NameCache, name: &str) -> Self {
        Self {
            name: cache.normalize(name),
            original_name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, cache: &NameCache, name: &str) -> Option<&str> {
        let normalized = cache.normalize(name);
        self.attributes
            .iter()
            .find(|a| a.name == normalized)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, cache: &NameCache, name: &str) -> bool {
        let normalized = cache.normalize(name);
        self.attributes.iter().any(|a| a.name == normalized)
    }

    /// Set an attribute, replacing the value of an existing one with the
    /// same normalized name; insertion order is preserved otherwise.
    pub fn set_attribute(&mut self, cache: &NameCache, name: &str, value: &str) {
        let normalized = cache.normalize(name);
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == normalized) {
            existing.value = value.to_string();
        } else {
            self.attributes.push(Attribute {
                name: normalized,
                original_name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    pub fn remove_attribute(&mut self, cache: &NameCache, name: &str) -> bool {
        let normalized = cache.normalize(name);
        let before = self.attributes.len();
        self.attributes.retain(|a| a.name != normalized);
        self.attributes.len() != before
    }
}

/// The closed set of node kinds. `Root` and `Element` are Tree Containers
/// owning an ordered child list; the rest are leaves.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "node_type")]
pub enum NodeKind {
    Root { children: Vec<NodeId> },
    Element(Element),
    Text { content: String },
    Comment { content: String },
    DataSection { content: String },
}

impl NodeKind {
    pub fn children(&self) -> Option<&Vec<NodeId>> {
        match self {
            NodeKind::Root { children } => Some(children),
            NodeKind::Element(element) => Some(&element.children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeKind::Root { children } => Some(children),
            NodeKind::Element(element) => Some(&mut element.children),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root { .. } | NodeKind::Element(_))
    }
}

/// A document node: kind payload plus the runtime processing state used by
/// the execution pipeline (precomputed processor bindings, skip flags,
/// node-local variables).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    #[serde(skip)]
    pub(crate) skippable: bool,
    #[serde(skip)]
    pub(crate) precomputed: bool,
    pub(crate) recompute_after_each_execution: bool,
    pub(crate) recompute_immediately: bool,
    pub(crate) local_variables: Option<HashMap<String, Value>>,
    #[serde(skip)]
    pub(crate) bindings: Vec<Arc<ProcessorBinding>>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            skippable: false,
            precomputed: false,
            recompute_after_each_execution: false,
            recompute_immediately: false,
            local_variables: None,
            bindings: Vec::new(),
            kind,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn is_skippable(&self) -> bool {
        self.skippable
    }

    pub fn is_precomputed(&self) -> bool {
        self.precomputed
    }

    pub fn recompute_after_each_execution(&self) -> bool {
        self.recompute_after_each_execution
    }

    pub fn set_recompute_after_each_execution(&mut self, recompute: bool) {
        self.recompute_after_each_execution = recompute;
    }

    pub fn recompute_immediately(&self) -> bool {
        self.recompute_immediately
    }

    pub fn set_recompute_immediately(&mut self, recompute: bool) {
        self.recompute_immediately = recompute;
    }

    pub fn bindings(&self) -> &[Arc<ProcessorBinding>] {
        &self.bindings
    }

    pub fn has_local_variables(&self) -> bool {
        self.local_variables
            .as_ref()
            .is_some_and(|vars| !vars.is_empty())
    }

    pub fn local_variables(&self) -> Option<&HashMap<String, Value>> {
        self.local_variables.as_ref()
    }

    pub fn add_local_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.local_variables
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
    }

    pub fn add_local_variables(&mut self, variables: HashMap<String, Value>) {
        self.local_variables
            .get_or_insert_with(HashMap::new)
            .extend(variables);
    }

    pub(crate) fn set_local_variables(&mut self, variables: Option<HashMap<String, Value>>) {
        self.local_variables = variables;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_prefix_is_skipped_when_blank() {
        assert_eq!(apply_dialect_prefix("text", ""), "text");
        assert_eq!(apply_dialect_prefix("text", "  "), "text");
        assert_eq!(apply_dialect_prefix("text", "th"), "th:text");
    }

    #[test]
    fn attributes_normalize_and_keep_order() {
        let cache = NameCache::new();
        let mut element = Element::new(&cache, "DIV");
        assert_eq!(element.name, "div");
        assert_eq!(element.original_name, "DIV");

        element.set_attribute(&cache, "Class", "wide");
        element.set_attribute(&cache, "ID", "main");
        element.set_attribute(&cache, "class", "narrow");

        assert_eq!(element.attributes.len(), 2);
        assert_eq!(element.attributes[0].name, "class");
        assert_eq!(element.attribute(&cache, "CLASS"), Some("narrow"));
        assert!(element.remove_attribute(&cache, "id"));
        assert!(!element.has_attribute(&cache, "id"));
    }

    #[test]
    fn local_variables_overlay() {
        let mut node = Node::new(NodeKind::Text {
            content: "hello".into(),
        });
        assert!(!node.has_local_variables());
        node.add_local_variable("depth", 3i64);
        assert!(node.has_local_variables());
        assert_eq!(
            node.local_variables().unwrap().get("depth"),
            Some(&Value::from(3i64))
        );
    }
}
