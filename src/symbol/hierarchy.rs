//! Nested view over a flat symbol list.
//!
//! The tree borrows from the flat list and is rebuilt whenever it is needed;
//! it is never persisted.

use std::collections::{HashMap, HashSet};

use super::Symbol;
use crate::error::{IndexError, Result};

/// A symbol and its nested children, ordered by start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNode<'a> {
    pub symbol: &'a Symbol,
    pub children: Vec<SymbolNode<'a>>,
}

/// Build the forest for `symbols`.
///
/// Roots are symbols without a parent, or whose parent is not in the list.
/// Fails with `MalformedHierarchy` if some symbol cannot be reached from a
/// root (a parent cycle).
pub fn build(symbols: &[Symbol]) -> Result<Vec<SymbolNode<'_>>> {
    let by_id: HashMap<&str, usize> = symbols
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    let mut roots = Vec::new();
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, symbol) in symbols.iter().enumerate() {
        match symbol.parent_id.as_deref().and_then(|p| by_id.get(p)) {
            Some(&parent) => children.entry(parent).or_default().push(i),
            None => roots.push(i),
        }
    }

    let mut placed = 0;
    let forest = assemble(symbols, &roots, &children, &mut placed);

    if placed != symbols.len() {
        let stranded = symbols
            .iter()
            .find(|s| s.parent_id.as_deref().is_some_and(|p| by_id.contains_key(p)))
            .map(|s| s.file.clone())
            .unwrap_or_default();
        return Err(IndexError::MalformedHierarchy {
            file: stranded,
            reason: format!(
                "{} symbols unreachable from any root",
                symbols.len() - placed
            ),
        });
    }

    Ok(forest)
}

fn assemble<'a>(
    symbols: &'a [Symbol],
    level: &[usize],
    children: &HashMap<usize, Vec<usize>>,
    placed: &mut usize,
) -> Vec<SymbolNode<'a>> {
    let mut ordered = level.to_vec();
    ordered.sort_by_key(|&i| (symbols[i].start_line, i));

    ordered
        .into_iter()
        .map(|i| {
            *placed += 1;
            let nested = children
                .get(&i)
                .map(|c| assemble(symbols, c, children, placed))
                .unwrap_or_default();
            SymbolNode {
                symbol: &symbols[i],
                children: nested,
            }
        })
        .collect()
}

/// Depth-first, pre-order flattening with nesting depth (roots are 0).
pub fn flatten<'a>(forest: &[SymbolNode<'a>]) -> Vec<(&'a Symbol, usize)> {
    fn walk<'a>(nodes: &[SymbolNode<'a>], depth: usize, out: &mut Vec<(&'a Symbol, usize)>) {
        for node in nodes {
            out.push((node.symbol, depth));
            walk(&node.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(forest, 0, &mut out);
    out
}

/// Check parent links: every `parent_id` resolves to a container symbol of
/// the same file, and following parents never loops.
pub fn validate(symbols: &[Symbol]) -> Result<()> {
    let by_id: HashMap<&str, &Symbol> = symbols.iter().map(|s| (s.id.as_str(), s)).collect();

    for symbol in symbols {
        let Some(parent_id) = symbol.parent_id.as_deref() else {
            continue;
        };
        let malformed = |reason: String| IndexError::MalformedHierarchy {
            file: symbol.file.clone(),
            reason,
        };

        let parent = by_id
            .get(parent_id)
            .ok_or_else(|| malformed(format!("{} has unknown parent {}", symbol.id, parent_id)))?;
        if parent.file != symbol.file {
            return Err(malformed(format!("{} has parent in {}", symbol.id, parent.file)));
        }
        if !parent.kind.is_container() {
            return Err(malformed(format!(
                "{} has non-container parent {} ({})",
                symbol.id, parent.id, parent.kind
            )));
        }

        let mut seen = HashSet::from([symbol.id.as_str()]);
        let mut cursor = Some(*parent);
        while let Some(current) = cursor {
            if !seen.insert(current.id.as_str()) {
                return Err(malformed(format!("parent cycle through {}", current.id)));
            }
            cursor = current.parent_id.as_deref().and_then(|p| by_id.get(p).copied());
        }
    }

    Ok(())
}
