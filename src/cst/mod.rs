//! Concrete syntax tree interface consumed by the extractor.
//!
//! The engine performs no parsing of its own. Anything that can expose node
//! kinds, byte and row/column positions, named fields, parent/sibling
//! navigation and an error flag can drive extraction: tree-sitter trees via
//! [`ParserPool`], or hand-built trees via [`MemoryTree`].

pub mod memory;
pub mod parser_pool;

use std::borrow::Cow;

pub use memory::{MemoryNode, MemoryTree, NodeId};
pub use parser_pool::{bundled_grammar, ParserPool, BUNDLED_LANGUAGES};

/// Zero-indexed row/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A node of a concrete syntax tree.
pub trait SyntaxNode: Copy {
    /// Grammar kind of the node, e.g. `function_definition`.
    fn kind(&self) -> &str;

    fn start_byte(&self) -> usize;

    fn end_byte(&self) -> usize;

    fn start_point(&self) -> Point;

    fn end_point(&self) -> Point;

    /// True if this node or any node below it is a syntax error.
    fn has_error(&self) -> bool;

    fn child_by_field_name(&self, field: &str) -> Option<Self>;

    /// All children, named and anonymous, in source order.
    fn children(&self) -> Vec<Self>;

    /// Named children in source order.
    fn named_children(&self) -> Vec<Self>;

    fn parent(&self) -> Option<Self>;

    fn prev_named_sibling(&self) -> Option<Self>;

    /// Source text covered by the node.
    fn text<'s>(&self, source: &'s [u8]) -> Cow<'s, str> {
        let end = self.end_byte().min(source.len());
        let start = self.start_byte().min(end);
        String::from_utf8_lossy(&source[start..end])
    }

    /// Last row that holds any of the node's text. A node ending at column 0
    /// (a line comment that swallowed its newline) ends on the previous row.
    fn last_row(&self) -> usize {
        let start = self.start_point();
        let end = self.end_point();
        if end.column == 0 && end.row > start.row {
            end.row - 1
        } else {
            end.row
        }
    }
}
