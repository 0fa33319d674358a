//! Tree-sitter grammars behind the [`SyntaxNode`] interface.
//!
//! Parsers keyed by language tag, plus the adapter that lets tree-sitter
//! nodes drive the extractor.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use super::{Point, SyntaxNode};
use crate::error::{IndexError, Result};

/// Language tags with a grammar compiled into the binary.
pub const BUNDLED_LANGUAGES: &[&str] = &["go", "java", "javascript", "python", "rust", "tsx", "typescript"];

/// The compiled-in grammar for `tag`.
pub fn bundled_grammar(tag: &str) -> Option<Language> {
    let grammar = match tag {
        "go" => tree_sitter_go::LANGUAGE,
        "java" => tree_sitter_java::LANGUAGE,
        "javascript" => tree_sitter_javascript::LANGUAGE,
        "python" => tree_sitter_python::LANGUAGE,
        "rust" => tree_sitter_rust::LANGUAGE,
        "tsx" => tree_sitter_typescript::LANGUAGE_TSX,
        "typescript" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        _ => return None,
    };
    Some(grammar.into())
}

/// Lazily configured parsers, one per language tag.
///
/// Not shared between threads; parallel extraction gives every worker its
/// own pool.
#[derive(Default)]
pub struct ParserPool {
    parsers: HashMap<String, Parser>,
    /// Grammars registered on top of the bundled ones
    extra: HashMap<String, Language>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `grammar` for `tag`, replacing a bundled or earlier one.
    pub fn with_grammar(mut self, tag: &str, grammar: Language) -> Self {
        self.parsers.remove(tag);
        self.extra.insert(tag.to_string(), grammar);
        self
    }

    /// Parse `source` with the grammar for `language`.
    pub fn parse(&mut self, language: &str, source: &[u8]) -> Result<Tree> {
        self.parser(language)?
            .parse(source, None)
            .ok_or_else(|| IndexError::Parse(format!("{language} source")))
    }

    fn parser(&mut self, tag: &str) -> Result<&mut Parser> {
        match self.parsers.entry(tag.to_string()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let grammar = self
                    .extra
                    .get(tag)
                    .cloned()
                    .or_else(|| bundled_grammar(tag))
                    .ok_or_else(|| IndexError::UnsupportedLanguage(tag.to_string()))?;

                let mut parser = Parser::new();
                parser
                    .set_language(&grammar)
                    .map_err(|e| IndexError::Parse(format!("{tag} grammar: {e}")))?;
                debug!("Created {} parser", tag);
                Ok(slot.insert(parser))
            }
        }
    }
}

fn point(p: tree_sitter::Point) -> Point {
    Point::new(p.row, p.column)
}

impl<'tree> SyntaxNode for Node<'tree> {
    fn kind(&self) -> &str {
        Node::kind(self)
    }

    fn start_byte(&self) -> usize {
        Node::start_byte(self)
    }

    fn end_byte(&self) -> usize {
        Node::end_byte(self)
    }

    fn start_point(&self) -> Point {
        point(Node::start_position(self))
    }

    fn end_point(&self) -> Point {
        point(Node::end_position(self))
    }

    fn has_error(&self) -> bool {
        Node::has_error(self)
    }

    fn child_by_field_name(&self, field: &str) -> Option<Self> {
        Node::child_by_field_name(self, field)
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.walk();
        Node::children(self, &mut cursor).collect()
    }

    fn named_children(&self) -> Vec<Self> {
        let mut cursor = self.walk();
        Node::named_children(self, &mut cursor).collect()
    }

    fn parent(&self) -> Option<Self> {
        Node::parent(self)
    }

    fn prev_named_sibling(&self) -> Option<Self> {
        Node::prev_named_sibling(self)
    }
}
