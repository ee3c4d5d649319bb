use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, DomTree, NodeId};

/// Serializable DOM tree: the format of `--snapshot` files and of the
/// fixtures the tests build. Text nodes use the tag `#text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Live value of a form control when it differs from its `value` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

pub const TEXT_TAG: &str = "#text";

impl SnapshotNode {
    pub fn el(tag: &str) -> Self {
        SnapshotNode {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: None,
            value: None,
            children: Vec::new(),
        }
    }

    pub fn text_node(text: &str) -> Self {
        SnapshotNode {
            text: Some(text.to_string()),
            ..Self::el(TEXT_TAG)
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = SnapshotNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Shorthand for appending a text child.
    pub fn with_text(self, text: &str) -> Self {
        self.child(SnapshotNode::text_node(text))
    }
}

impl DomTree {
    pub fn from_snapshot(root: &SnapshotNode) -> DomTree {
        let mut tree = DomTree::new();
        let parent = tree.root();
        load_node(&mut tree, parent, root);
        tree
    }

    /// First top-level element and everything under it.
    pub fn to_snapshot(&self) -> Option<SnapshotNode> {
        let top = self
            .children(self.root())
            .iter()
            .copied()
            .find(|node| self.element(*node).is_some())?;
        Some(save_node(self, top))
    }
}

impl Document {
    pub fn from_snapshot(root: &SnapshotNode) -> Document {
        Document::new(DomTree::from_snapshot(root))
    }

    pub fn to_snapshot(&self) -> Option<SnapshotNode> {
        self.tree().to_snapshot()
    }
}

fn load_node(tree: &mut DomTree, parent: NodeId, node: &SnapshotNode) {
    if node.tag == TEXT_TAG {
        tree.append_text(parent, node.text.as_deref().unwrap_or(""));
        return;
    }

    let id = tree.append_element(parent, &node.tag);
    for (name, value) in &node.attrs {
        tree.set_attr(id, name, value);
    }
    if let Some(value) = &node.value {
        tree.set_value(id, value);
    }
    if let Some(text) = &node.text {
        tree.append_text(id, text);
    }
    for child in &node.children {
        load_node(tree, id, child);
    }
}

fn save_node(tree: &DomTree, node: NodeId) -> SnapshotNode {
    if let Some(text) = tree.text_node(node) {
        return SnapshotNode::text_node(text);
    }

    let mut out = SnapshotNode::el("div");
    if let Some(element) = tree.element(node) {
        out.tag = element.tag.clone();
        out.attrs = element
            .attrs()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if element.value() != element.attr("value").unwrap_or("") {
            out.value = Some(element.value().to_string());
        }
    }
    out.children = tree
        .children(node)
        .iter()
        .map(|child| save_node(tree, *child))
        .collect();
    out
}
