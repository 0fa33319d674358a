//! In-memory syntax tree.
//!
//! Lets callers with their own parser (or tests) hand the extractor a tree
//! built node by node. Positions are derived from the source bytes given at
//! construction.

use std::ops::Range;

use super::{Point, SyntaxNode};

/// Index of a node inside a [`MemoryTree`].
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    range: Range<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    fields: Vec<(String, NodeId)>,
    named: bool,
    error: bool,
}

/// Arena-backed syntax tree over a fixed source buffer.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    source: Vec<u8>,
    line_starts: Vec<usize>,
    nodes: Vec<NodeData>,
}

impl MemoryTree {
    /// Create a tree whose root, of kind `root_kind`, spans all of `source`.
    pub fn new(source: &[u8], root_kind: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            source: source.to_vec(),
            line_starts,
            nodes: vec![NodeData {
                kind: root_kind.to_string(),
                range: 0..source.len(),
                parent: None,
                children: Vec::new(),
                fields: Vec::new(),
                named: true,
                error: false,
            }],
        }
    }

    pub fn root_id(&self) -> NodeId {
        0
    }

    pub fn root(&self) -> MemoryNode<'_> {
        self.node(self.root_id())
    }

    pub fn node(&self, id: NodeId) -> MemoryNode<'_> {
        MemoryNode { tree: self, id }
    }

    /// Add a named child covering `range`. Children stay ordered by start byte.
    pub fn add(&mut self, parent: NodeId, kind: &str, range: Range<usize>) -> NodeId {
        self.push(parent, kind, range, true)
    }

    /// Add an anonymous (punctuation/keyword) child.
    pub fn add_anonymous(&mut self, parent: NodeId, kind: &str, range: Range<usize>) -> NodeId {
        self.push(parent, kind, range, false)
    }

    /// Add a named child and expose it under `field` on the parent.
    pub fn add_field(
        &mut self,
        parent: NodeId,
        field: &str,
        kind: &str,
        range: Range<usize>,
    ) -> NodeId {
        let id = self.add(parent, kind, range);
        self.nodes[parent].fields.push((field.to_string(), id));
        id
    }

    /// Flag a node as a syntax error.
    pub fn mark_error(&mut self, id: NodeId) {
        self.nodes[id].error = true;
    }

    /// Byte range of the first occurrence of `needle` at or after `from`.
    pub fn span_from(&self, from: usize, needle: &str) -> Option<Range<usize>> {
        if needle.is_empty() {
            return None;
        }
        let offset = self
            .source
            .get(from..)?
            .windows(needle.len())
            .position(|w| w == needle.as_bytes())?;
        Some(from + offset..from + offset + needle.len())
    }

    /// Byte range of the first occurrence of `needle`.
    pub fn span(&self, needle: &str) -> Option<Range<usize>> {
        self.span_from(0, needle)
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    fn push(&mut self, parent: NodeId, kind: &str, range: Range<usize>, named: bool) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData {
            kind: kind.to_string(),
            range,
            parent: Some(parent),
            children: Vec::new(),
            fields: Vec::new(),
            named,
            error: false,
        });

        let start = self.nodes[id].range.start;
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&c| self.nodes[c].range.start > start)
            .unwrap_or(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(position, id);
        id
    }

    fn point(&self, byte: usize) -> Point {
        let row = self.line_starts.partition_point(|&s| s <= byte) - 1;
        Point::new(row, byte - self.line_starts[row])
    }

    fn subtree_has_error(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.error || node.children.iter().any(|&c| self.subtree_has_error(c))
    }
}

/// Borrowed handle to a node of a [`MemoryTree`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryNode<'a> {
    tree: &'a MemoryTree,
    id: NodeId,
}

impl<'a> MemoryNode<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id]
    }

    fn wrap(&self, id: NodeId) -> Self {
        Self { tree: self.tree, id }
    }
}

impl<'a> SyntaxNode for MemoryNode<'a> {
    fn kind(&self) -> &str {
        &self.data().kind
    }

    fn start_byte(&self) -> usize {
        self.data().range.start
    }

    fn end_byte(&self) -> usize {
        self.data().range.end
    }

    fn start_point(&self) -> Point {
        self.tree.point(self.start_byte())
    }

    fn end_point(&self) -> Point {
        self.tree.point(self.end_byte())
    }

    fn has_error(&self) -> bool {
        self.tree.subtree_has_error(self.id)
    }

    fn child_by_field_name(&self, field: &str) -> Option<Self> {
        self.data()
            .fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, id)| self.wrap(*id))
    }

    fn children(&self) -> Vec<Self> {
        self.data().children.iter().map(|&id| self.wrap(id)).collect()
    }

    fn named_children(&self) -> Vec<Self> {
        self.data()
            .children
            .iter()
            .filter(|&&id| self.tree.nodes[id].named)
            .map(|&id| self.wrap(id))
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| self.wrap(id))
    }

    fn prev_named_sibling(&self) -> Option<Self> {
        let parent = self.data().parent?;
        let siblings = &self.tree.nodes[parent].children;
        let position = siblings.iter().position(|&id| id == self.id)?;
        siblings[..position]
            .iter()
            .rev()
            .find(|&&id| self.tree.nodes[id].named)
            .map(|&id| self.wrap(id))
    }
}
