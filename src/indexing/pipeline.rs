//! Pipeline data structures for parallel extraction

use crate::symbol::Symbol;

/// File content handed to the engine by a lister
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Forward-slash path relative to the unit root
    pub path: String,
    pub content: Vec<u8>,
    /// Language tag, e.g. `python`
    pub language: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language: language.into(),
        }
    }

    /// BLAKE3 hex digest of the content
    pub fn hash(&self) -> String {
        content_hash(&self.content)
    }
}

/// One file's extraction result, ready to be placed in an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtraction {
    pub path: String,
    pub language: String,
    pub hash: String,
    pub line_count: usize,
    pub byte_len: usize,
    pub symbols: Vec<Symbol>,
}

/// BLAKE3 hex digest of `content`
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Number of lines in `content`; a trailing newline does not open a new line
pub fn line_count(content: &[u8]) -> usize {
    if content.is_empty() {
        return 0;
    }
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    if content.ends_with(b"\n") {
        newlines
    } else {
        newlines + 1
    }
}
