//! Weighted lexical symbol search.
//!
//! Every symbol passing the kind and path filters is scored against the
//! query; ordering is fully deterministic.

use std::collections::BTreeSet;

use glob::Pattern;
use serde::Serialize;
use tracing::debug;

use super::{Symbol, SymbolKind};
use crate::error::{IndexError, Result};
use crate::storage::Index;

const EXACT_NAME: u32 = 20;
const NAME_CONTAINS_QUERY: u32 = 10;
const WORD_IN_NAME: u32 = 5;
const SIGNATURE_CONTAINS_QUERY: u32 = 8;
const WORD_IN_SIGNATURE: u32 = 2;
const SUMMARY_CONTAINS_QUERY: u32 = 5;
const WORD_IN_SUMMARY: u32 = 1;
const WORD_IN_KEYWORDS: u32 = 3;
const WORD_IN_DOCUMENTATION: u32 = 1;

/// Default number of hits returned.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Only symbols of exactly this kind
    pub kind: Option<SymbolKind>,
    /// Glob matched against the symbol's file path
    pub path_glob: Option<String>,
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: None,
            path_glob: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_path_glob(mut self, glob: impl Into<String>) -> Self {
        self.path_glob = Some(glob.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// A scored match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit<'a> {
    pub symbol: &'a Symbol,
    pub score: u32,
}

/// Path filter: a glob matched against the whole path, or against any
/// suffix after a `/` (`main.py` matches `src/main.py`).
struct PathFilter {
    exact: Pattern,
    nested: Pattern,
}

impl PathFilter {
    fn new(glob: &str) -> Result<Self> {
        let compile = |pattern: &str| {
            Pattern::new(pattern).map_err(|source| IndexError::InvalidGlob {
                pattern: glob.to_string(),
                source,
            })
        };
        Ok(Self {
            exact: compile(glob)?,
            nested: compile(&format!("*/{glob}"))?,
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.exact.matches(path) || self.nested.matches(path)
    }
}

/// Rank the symbols of `index` against `query`.
///
/// Zero scores are dropped; ties are broken by file, start line, then ID.
/// A blank query matches nothing.
pub fn search<'a>(index: &'a Index, query: &SearchQuery) -> Result<Vec<SearchHit<'a>>> {
    let path_filter = query.path_glob.as_deref().map(PathFilter::new).transpose()?;

    let query_lower = query.query.trim().to_lowercase();
    if query_lower.is_empty() {
        return Ok(Vec::new());
    }
    let words: BTreeSet<&str> = query_lower.split_whitespace().collect();

    let mut hits: Vec<SearchHit<'a>> = index
        .symbols
        .iter()
        .filter(|s| query.kind.map_or(true, |k| s.kind == k))
        .filter(|s| path_filter.as_ref().map_or(true, |f| f.matches(&s.file)))
        .filter_map(|symbol| {
            let score = score_symbol(symbol, &query_lower, &words);
            (score > 0).then_some(SearchHit { symbol, score })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.symbol.file.cmp(&b.symbol.file))
            .then_with(|| a.symbol.start_line.cmp(&b.symbol.start_line))
            .then_with(|| a.symbol.id.cmp(&b.symbol.id))
    });
    hits.truncate(query.max_results);

    debug!(
        "Search '{}' matched {} symbols in {}",
        query.query,
        hits.len(),
        index.unit_key
    );

    Ok(hits)
}

/// Score one symbol. `query_lower` is the trimmed lowercase query and
/// `words` its distinct whitespace-separated words.
pub fn score_symbol(symbol: &Symbol, query_lower: &str, words: &BTreeSet<&str>) -> u32 {
    let mut score = 0;

    let name = symbol.name.to_lowercase();
    if name == query_lower {
        score += EXACT_NAME;
    } else if name.contains(query_lower) {
        score += NAME_CONTAINS_QUERY;
    }
    score += WORD_IN_NAME * count_present(words, &name);

    let signature = symbol.signature.to_lowercase();
    if signature.contains(query_lower) {
        score += SIGNATURE_CONTAINS_QUERY;
    }
    score += WORD_IN_SIGNATURE * count_present(words, &signature);

    let summary = symbol.summary.to_lowercase();
    if summary.contains(query_lower) {
        score += SUMMARY_CONTAINS_QUERY;
    }
    score += WORD_IN_SUMMARY * count_present(words, &summary);

    let keyword_hits = words
        .iter()
        .filter(|w| symbol.keywords.iter().any(|k| k == *w))
        .count() as u32;
    score += WORD_IN_KEYWORDS * keyword_hits;

    let documentation = symbol.documentation.to_lowercase();
    score += WORD_IN_DOCUMENTATION * count_present(words, &documentation);

    score
}

fn count_present(words: &BTreeSet<&str>, haystack: &str) -> u32 {
    words.iter().filter(|w| haystack.contains(**w)).count() as u32
}
