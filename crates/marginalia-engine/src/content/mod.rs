//! Content models the indexer can walk.
//!
//! [`ContentTree`] is a small arena of element and text nodes standing in for
//! a rendered document (what a webview would hold as a DOM). [`PlainText`]
//! treats raw text as one node per line.

pub mod html;
pub mod markdown;
pub mod plain;

pub use html::render_html;
pub use markdown::render;
pub use plain::PlainText;

use crate::anchoring::TextSource;

/// Index of a node inside its [`ContentTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        /// When false the whole subtree is invisible to the indexer
        indexable: bool,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-allocated document tree with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTree {
    nodes: Vec<Node>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new("div")
    }
}

impl ContentTree {
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Element {
                    tag: root_tag.to_string(),
                    attrs: Vec::new(),
                    indexable: true,
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.append_element_with_attrs(parent, tag, Vec::new())
    }

    pub fn append_element_with_attrs(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attrs,
                indexable: true,
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    /// Mark an element (and everything under it) as visible or invisible to indexing.
    /// Returns false when `id` is not an element.
    pub fn set_indexable(&mut self, id: NodeId, value: bool) -> bool {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element { indexable, .. }) => {
                *indexable = value;
                true
            }
            _ => false,
        }
    }

    /// Concatenated text of the subtree, indexable or not.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        id
    }

    fn walk_text(&self, id: NodeId, visit: &mut dyn FnMut(NodeId, &str)) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => visit(id, text),
            NodeKind::Element {
                indexable: false, ..
            } => {}
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.walk_text(*child, visit);
                }
            }
        }
    }
}

impl TextSource for ContentTree {
    type Node = NodeId;

    fn for_each_text(&self, visit: &mut dyn FnMut(NodeId, &str)) {
        self.walk_text(self.root(), visit);
    }
}
