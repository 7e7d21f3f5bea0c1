//! Minimal AST contract consumed by the dispatch core
//!
//! The core does not parse source text. Callers supply a [`Parser`] that
//! produces a [`ParsedSource`] (buffer + tree); the tree is an arena of
//! nodes with string kind tags, child lists, and source ranges. This is
//! the narrow surface the commissioner and cops traverse.

use crate::source::{SourceBuffer, SourceRange};
use std::sync::Arc;
use thiserror::Error;

/// Error produced by an external parser
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse error in {name} at line {line}: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },

    #[error("invalid document: {0}")]
    Invalid(String),
}

/// Index of a node within its [`Tree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    kind: String,
    range: SourceRange,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-allocated tree, nodes stored in creation order
#[derive(Debug, Default, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; the first node added becomes the root
    pub fn add_node(
        &mut self,
        kind: impl Into<String>,
        range: SourceRange,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: kind.into(),
            range,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        } else if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.map(|id| NodeRef { tree: self, id })
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first pre-order walk from the root, parent before children
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }
}

/// Borrowed view of one node with tree-navigation helpers
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node(&self) -> &'t Node {
        &self.tree.nodes[self.id.0]
    }

    /// Node type tag (e.g. "send", "int", "lvar")
    pub fn kind(&self) -> &'t str {
        &self.node().kind
    }

    pub fn range(&self) -> SourceRange {
        self.node().range
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.node().parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + '_ {
        self.node().children.iter().map(|&id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// The substring of `buffer` this node covers
    pub fn source<'a>(&self, buffer: &'a SourceBuffer) -> &'a str {
        self.range().source(buffer)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Pre-order iterator over a tree
pub struct Preorder<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id.0];
        // Push in reverse so the first child pops first
        self.stack.extend(node.children.iter().rev().copied());
        Some(NodeRef {
            tree: self.tree,
            id,
        })
    }
}

/// A buffer together with its parsed tree
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub buffer: Arc<SourceBuffer>,
    pub tree: Tree,
}

impl ParsedSource {
    pub fn new(buffer: SourceBuffer, tree: Tree) -> Self {
        Self {
            buffer: Arc::new(buffer),
            tree,
        }
    }
}

/// External parser collaborator
///
/// The correction loop calls this to re-parse rewritten text between
/// passes; the core itself never parses.
pub trait Parser {
    fn parse(&self, source: &str, name: &str) -> Result<ParsedSource, ParseError>;
}

impl<F> Parser for F
where
    F: Fn(&str, &str) -> Result<ParsedSource, ParseError>,
{
    fn parse(&self, source: &str, name: &str) -> Result<ParsedSource, ParseError> {
        self(source, name)
    }
}
