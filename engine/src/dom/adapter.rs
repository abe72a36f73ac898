//! Translation of an external parsed-DOM representation into engine nodes.

use serde::{Deserialize, Serialize};

use crate::dom::document::Document;
use crate::dom::node::NodeId;
use crate::error::EngineError;

/// Node representation handed over by an external document parser.
///
/// Only the kinds the engine can process are translatable; the rest fail
/// fast rather than being silently skipped.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "kind")]
pub enum ExternalNode {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<ExternalNode>,
    },
    Text {
        content: String,
    },
    Comment {
        content: String,
    },
    CData {
        content: String,
    },
    ProcessingInstruction {
        target: String,
        content: String,
    },
    DocumentType {
        name: String,
    },
}

/// Translate `external` into the engine's node variants and attach the
/// result under `parent`.
///
/// All-or-nothing: an unrecognized kind anywhere in the subtree fails the
/// whole translation and nothing is attached under `parent`.
pub fn translate(
    doc: &mut Document,
    external: &ExternalNode,
    parent: NodeId,
) -> Result<NodeId, EngineError> {
    let id = translate_detached(doc, external)?;
    doc.append_child(parent, id)?;
    Ok(id)
}

fn translate_detached(doc: &mut Document, external: &ExternalNode) -> Result<NodeId, EngineError> {
    match external {
        ExternalNode::Element {
            name,
            attributes,
            children,
        } => {
            let id = doc.create_element(name);
            for (attr_name, attr_value) in attributes {
                doc.set_attribute(id, attr_name, attr_value)?;
            }
            for child in children {
                let child_id = translate_detached(doc, child)?;
                doc.append_child(id, child_id)?;
            }
            Ok(id)
        }
        ExternalNode::Text { content } => Ok(doc.create_text(content)),
        ExternalNode::Comment { content } => Ok(doc.create_comment(content)),
        ExternalNode::CData { content } => Ok(doc.create_data_section(content)),
        ExternalNode::ProcessingInstruction { target, .. } => Err(EngineError::translate(format!(
            "External node kind 'processing-instruction' (target: {}) has no engine representation",
            target
        ))),
        ExternalNode::DocumentType { name } => Err(EngineError::translate(format!(
            "External node kind 'doctype' (name: {}) has no engine representation",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::NameCache;
    use crate::dom::node::NodeKind;

    fn setup_document() -> Document {
        Document::new(Arc::new(NameCache::new()))
    }

    fn sample_tree() -> ExternalNode {
        ExternalNode::Element {
            name: "Article".into(),
            attributes: vec![("Data-Kind".into(), "post".into())],
            children: vec![
                ExternalNode::Text {
                    content: "intro".into(),
                },
                ExternalNode::Comment {
                    content: "todo".into(),
                },
                ExternalNode::CData {
                    content: "<raw>".into(),
                },
            ],
        }
    }

    #[test]
    fn translates_all_supported_kinds() {
        let mut doc = setup_document();
        let root = doc.root();
        let article = translate(&mut doc, &sample_tree(), root).unwrap();

        let element = doc.get_node(article).unwrap().as_element().unwrap();
        assert_eq!(element.name, "article");
        assert_eq!(doc.attribute(article, "data-kind"), Some("post"));

        let children = doc.child_ids(article);
        assert_eq!(children.len(), 3);
        assert!(matches!(
            doc.get_node(children[0]).unwrap().kind(),
            NodeKind::Text { content } if content == "intro"
        ));
        assert!(matches!(
            doc.get_node(children[1]).unwrap().kind(),
            NodeKind::Comment { content } if content == "todo"
        ));
        assert!(matches!(
            doc.get_node(children[2]).unwrap().kind(),
            NodeKind::DataSection { content } if content == "<raw>"
        ));
    }

    #[test]
    fn unrecognized_kind_fails_without_attaching() {
        let mut doc = setup_document();
        let root = doc.root();
        let external = ExternalNode::Element {
            name: "div".into(),
            attributes: vec![],
            children: vec![
                ExternalNode::Text {
                    content: "ok".into(),
                },
                ExternalNode::ProcessingInstruction {
                    target: "php".into(),
                    content: "echo".into(),
                },
            ],
        };

        let err = translate(&mut doc, &external, root).unwrap_err();
        assert!(matches!(err, EngineError::Translate(_)));
        assert!(doc.child_ids(root).is_empty());
    }

    #[test]
    fn doctype_is_rejected() {
        let mut doc = setup_document();
        let root = doc.root();
        let err = translate(
            &mut doc,
            &ExternalNode::DocumentType {
                name: "html".into(),
            },
            root,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Translate(_)));
    }
}
