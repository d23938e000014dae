use std::fmt::Write as _;
use std::ops::Index;

use efml_errors::Diagnostic;
use text_size::TextSize;

use crate::SyntaxKind;
use crate::arena::Arena;
use crate::node::{Node, NodeData, NodeId};
use crate::visitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageVariant {
    Unknown,
    #[default]
    Html,
}

/// A parsed document: the node arena, its root, the text it was parsed from and
/// the diagnostics produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    text: String,
    variant: LanguageVariant,
    nodes: Arena<Node>,
    root: NodeId,
    diagnostics: Vec<Diagnostic>,
}

impl SourceFile {
    pub fn new(
        text: String,
        variant: LanguageVariant,
        nodes: Arena<Node>,
        root: NodeId,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self { text, variant, nodes, root, diagnostics }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn variant(&self) -> LanguageVariant {
        self.variant
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn end(&self) -> TextSize {
        self[self.root].position.range.end()
    }

    pub fn lines(&self) -> &[NodeId] {
        match &self[self.root].data {
            NodeData::Root(root) => &root.children,
            _ => &[],
        }
    }

    pub fn end_of_file(&self) -> Option<NodeId> {
        match &self[self.root].data {
            NodeData::Root(root) => Some(root.end_of_file),
            _ => None,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self[id].kind()
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        &self.text[self[id].position.range]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&node| self.parent(node))
    }

    pub fn for_each_child<T>(
        &self,
        id: NodeId,
        f: impl FnMut(NodeId) -> Option<T>,
    ) -> Option<T> {
        visitor::for_each_child(&self[id].data, f)
    }

    /// Pre-order walk over every descendant of `id`, stopping at the first
    /// `Some`.
    pub fn for_each_child_recursively<T>(
        &self,
        id: NodeId,
        mut f: impl FnMut(NodeId) -> Option<T>,
    ) -> Option<T> {
        let mut stack = Vec::new();
        self.push_children_reversed(id, &mut stack);

        while let Some(node) = stack.pop() {
            if let Some(result) = f(node) {
                return Some(result);
            }
            self.push_children_reversed(node, &mut stack);
        }

        None
    }

    fn push_children_reversed(&self, id: NodeId, stack: &mut Vec<NodeId>) {
        let start = stack.len();
        self.for_each_child(id, |child| {
            stack.push(child);
            None::<()>
        });
        stack[start..].reverse();
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        self.push_children_reversed(id, &mut children);
        children.reverse();
        children
    }

    pub fn find(&self, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.for_each_child_recursively(self.root, |id| predicate(&self[id]).then_some(id))
    }

    pub fn find_all(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.for_each_child_recursively(self.root, |id| {
            if predicate(&self[id]) {
                found.push(id);
            }
            None::<()>
        });
        found
    }

    /// Tokens and string literals in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.find_all(|node| matches!(node.data, NodeData::Token(_) | NodeData::StringLiteral))
    }

    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        self.dump(self.root, 0, &mut out);
        out
    }

    fn dump(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self[id];
        let range = node.position.range;
        let _ = write!(out, "{:indent$}{:?}@{:?}", "", node.kind(), range, indent = depth * 2);

        if matches!(node.data, NodeData::Token(_) | NodeData::StringLiteral) {
            let _ = write!(out, " {:?}", self.node_text(id));
        }
        if node.missing {
            out.push_str(" missing");
        }
        out.push('\n');

        for child in self.children(id) {
            self.dump(child, depth + 1, out);
        }
    }
}

impl Index<NodeId> for SourceFile {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}
