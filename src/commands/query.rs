//! Read-only commands: search, outline, tree and show.

use anyhow::{anyhow, bail, Result};
use serde_json::json;

use crate::config::Config;
use crate::query;
use crate::storage::{Index, IndexStore};
use crate::symbol::{search, SearchQuery, SymbolKind};

fn load(store: &IndexStore, unit: &str) -> Result<Index> {
    store
        .load(unit)?
        .ok_or_else(|| anyhow!("Unit '{}' is not indexed. Run 'symdex index' first.", unit))
}

pub fn search_symbols(
    store: &IndexStore,
    config: &Config,
    unit: &str,
    text: &str,
    kind: Option<&str>,
    path: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let index = load(store, unit)?;

    let mut request = SearchQuery::new(text).with_max_results(limit.unwrap_or(config.search.default_limit));
    if let Some(kind) = kind {
        let Some(kind) = SymbolKind::parse(kind) else {
            bail!("Unknown symbol kind '{}'", kind);
        };
        request = request.with_kind(kind);
    }
    if let Some(path) = path {
        request = request.with_path_glob(path);
    }

    let hits = search(&index, &request)?;
    let results: Vec<_> = hits
        .iter()
        .map(|hit| {
            json!({
                "id": hit.symbol.id,
                "kind": hit.symbol.kind,
                "name": hit.symbol.name,
                "file": hit.symbol.file,
                "line": hit.symbol.start_line,
                "signature": hit.symbol.signature,
                "summary": hit.symbol.summary,
                "score": hit.score,
            })
        })
        .collect();

    super::print_json(&json!({
        "unit": unit,
        "query": text,
        "result_count": results.len(),
        "results": results,
    }))
}

pub fn outline(store: &IndexStore, unit: &str, file: &str) -> Result<()> {
    let index = load(store, unit)?;
    let Some(symbols) = query::file_outline(&index, file)? else {
        bail!("File '{}' is not indexed in unit '{}'", file, unit);
    };
    super::print_json(&json!({
        "unit": unit,
        "file": file,
        "language": index.files.get(file).map(|m| m.language.as_str()),
        "symbols": symbols,
    }))
}

pub fn tree(store: &IndexStore, unit: &str, prefix: &str) -> Result<()> {
    let index = load(store, unit)?;
    super::print_json(&json!({
        "unit": unit,
        "prefix": prefix,
        "tree": query::file_tree(&index, prefix),
    }))
}

pub fn show(store: &IndexStore, unit: &str, ids: &[String]) -> Result<()> {
    let symbols = query::get_symbols(store, unit, ids)?;
    super::print_json(&symbols)
}
