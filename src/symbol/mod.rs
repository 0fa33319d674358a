//! Symbol model, extraction, hierarchy and search.
//!
//! A [`Symbol`] is one extracted declaration. The flat list of symbols is the
//! authoritative, persisted form; the nested view is derived on demand by
//! [`hierarchy::build`].

pub mod extractor;
pub mod hierarchy;
pub mod id;
pub mod index;
pub mod search;

use serde::{Deserialize, Serialize};

pub use extractor::{Extraction, SkipReason, SkippedNode, SymbolExtractor};
pub use hierarchy::SymbolNode;
pub use id::{decode_path, encode_path, make_symbol_id, split_symbol_id};
pub use index::SymbolTable;
pub use search::{search, SearchHit, SearchQuery};

/// Kinds of symbols the engine extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A standalone function
    Function,
    /// A class, or a container such as a Rust impl block
    Class,
    /// A function declared inside a container
    Method,
    /// An upper-case constant declaration
    Constant,
    /// A struct, enum, interface, trait or type alias
    Type,
}

impl SymbolKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Constant => "constant",
            SymbolKind::Type => "type",
        }
    }

    /// Parse from a string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "class" => Some(SymbolKind::Class),
            "method" => Some(SymbolKind::Method),
            "constant" => Some(SymbolKind::Constant),
            "type" => Some(SymbolKind::Type),
            _ => None,
        }
    }

    /// Whether symbols of this kind may own children.
    pub fn is_container(&self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::Type)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted declaration.
///
/// Source content is never stored here: it is read back from the unit's
/// backing files using `byte_offset` and `byte_length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// `{fileSlug}::{qualifiedName}`
    pub id: String,
    /// Relative path of the file declaring the symbol
    pub file: String,
    pub name: String,
    /// Dot-joined container chain ending in `name`
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub language: String,
    /// Declaration header without the body
    pub signature: String,
    #[serde(default)]
    pub documentation: String,
    /// Filled in by a summarizer, never by the extractor
    #[serde(default)]
    pub summary: String,
    /// Decorator, annotation or attribute texts in source order
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Lowercase search tokens
    #[serde(default)]
    pub keywords: Vec<String>,
    /// ID of the enclosing container symbol in the same file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// 1-indexed, inclusive
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
}

impl Symbol {
    /// Exclusive end of the symbol's byte span.
    pub fn byte_end(&self) -> usize {
        self.byte_offset + self.byte_length
    }
}
