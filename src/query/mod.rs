//! Read-side views over a committed index: symbol lookup with source, file
//! outlines and the file tree.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{IndexError, Result};
use crate::storage::{Index, IndexStore};
use crate::symbol::{hierarchy, Symbol, SymbolKind, SymbolNode};

/// Outcome of looking up one ID.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolLookup {
    Found {
        symbol: Symbol,
        source: String,
    },
    NotFound {
        id: String,
        error: String,
    },
}

/// Look up several symbols of one unit, each with its source.
///
/// All lookups read the same generation. Unknown IDs and missing backing
/// content are reported per entry; an unknown unit fails the whole call.
pub fn get_symbols(store: &IndexStore, unit: &str, ids: &[String]) -> Result<Vec<SymbolLookup>> {
    let (generation, index) = store
        .load_generation(unit)?
        .ok_or_else(|| IndexError::UnitNotFound(unit.to_string()))?;
    let table = index.symbol_table();

    ids.iter()
        .map(|id| {
            let Some(symbol) = table.get(id) else {
                return Ok(SymbolLookup::NotFound {
                    id: id.clone(),
                    error: IndexError::SymbolNotFound(id.clone()).to_string(),
                });
            };
            match store.read_content_at(unit, generation, symbol) {
                Ok(bytes) => Ok(SymbolLookup::Found {
                    symbol: symbol.clone(),
                    source: String::from_utf8_lossy(&bytes).into_owned(),
                }),
                Err(e @ IndexError::ContentMissing { .. }) => Ok(SymbolLookup::NotFound {
                    id: id.clone(),
                    error: e.to_string(),
                }),
                Err(e) => Err(e),
            }
        })
        .collect()
}

/// One symbol in a file outline, with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub id: String,
    pub name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub summary: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineEntry>,
}

impl OutlineEntry {
    fn from_node(node: &SymbolNode<'_>) -> Self {
        let s = node.symbol;
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            kind: s.kind,
            signature: s.signature.clone(),
            summary: s.summary.clone(),
            start_line: s.start_line,
            end_line: s.end_line,
            children: node.children.iter().map(Self::from_node).collect(),
        }
    }
}

/// Nested outline of `path`, or `None` if the file is not indexed.
pub fn file_outline(index: &Index, path: &str) -> Result<Option<Vec<OutlineEntry>>> {
    if index.source_files.binary_search_by(|p| p.as_str().cmp(path)).is_err() {
        return Ok(None);
    }

    let symbols: Vec<Symbol> = index
        .symbols
        .iter()
        .filter(|s| s.file == path)
        .cloned()
        .collect();
    let forest = hierarchy::build(&symbols)?;
    Ok(Some(forest.iter().map(OutlineEntry::from_node).collect()))
}

/// A directory or file in [`file_tree`] output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Dir {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        language: String,
        symbol_count: usize,
        line_count: usize,
    },
}

impl TreeNode {
    pub fn path(&self) -> &str {
        match self {
            TreeNode::Dir { path, .. } | TreeNode::File { path, .. } => path,
        }
    }
}

#[derive(Default)]
struct DirBuilder<'a> {
    dirs: BTreeMap<&'a str, DirBuilder<'a>>,
    files: BTreeMap<&'a str, &'a str>,
}

/// Directory tree of the indexed files under `prefix` (all files when empty).
/// The prefix matches whole path segments. Directories come before files;
/// both are ordered by name.
pub fn file_tree(index: &Index, prefix: &str) -> Vec<TreeNode> {
    let prefix = prefix
        .trim_start_matches("./")
        .trim_start_matches('/')
        .trim_end_matches('/');

    let mut symbol_counts: HashMap<&str, usize> = HashMap::new();
    for symbol in &index.symbols {
        *symbol_counts.entry(symbol.file.as_str()).or_insert(0) += 1;
    }

    let mut root = DirBuilder::default();
    for path in index.source_files.iter().filter(|p| under_prefix(p, prefix)) {
        let mut parts: Vec<&str> = path.split('/').collect();
        let Some(name) = parts.pop() else { continue };
        let dir = parts
            .into_iter()
            .fold(&mut root, |dir, part| dir.dirs.entry(part).or_default());
        dir.files.insert(name, path.as_str());
    }

    render(root, "", index, &symbol_counts)
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn render(dir: DirBuilder<'_>, parent: &str, index: &Index, symbol_counts: &HashMap<&str, usize>) -> Vec<TreeNode> {
    let mut nodes = Vec::with_capacity(dir.dirs.len() + dir.files.len());

    for (name, sub) in dir.dirs {
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        };
        let children = render(sub, &path, index, symbol_counts);
        nodes.push(TreeNode::Dir {
            name: name.to_string(),
            path,
            children,
        });
    }

    for (name, path) in dir.files {
        let meta = index.files.get(path);
        nodes.push(TreeNode::File {
            name: name.to_string(),
            path: path.to_string(),
            language: meta.map(|m| m.language.clone()).unwrap_or_default(),
            symbol_count: symbol_counts.get(path).copied().unwrap_or(0),
            line_count: meta.map_or(0, |m| m.line_count),
        });
    }

    nodes
}
