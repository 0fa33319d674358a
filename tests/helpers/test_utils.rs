use symdex::cst::ParserPool;
use symdex::language::ProfileRegistry;
use symdex::storage::Index;
use symdex::symbol::{Symbol, SymbolExtractor};

/// Parse `source` with tree-sitter and extract its symbols.
pub fn extract(language: &str, path: &str, source: &str) -> Vec<Symbol> {
    let registry = ProfileRegistry::builtin();
    let mut parsers = ParserPool::new();
    let tree = parsers.parse(language, source.as_bytes()).unwrap();
    SymbolExtractor::new(&registry)
        .extract(source.as_bytes(), path, language, tree.root_node())
        .unwrap()
        .symbols
}

/// Find a symbol by qualified name, panicking with the available names.
pub fn by_name<'a>(symbols: &'a [Symbol], qualified: &str) -> &'a Symbol {
    symbols
        .iter()
        .find(|s| s.qualified_name == qualified)
        .unwrap_or_else(|| {
            let names: Vec<_> = symbols.iter().map(|s| s.qualified_name.as_str()).collect();
            panic!("no symbol {qualified}; have {names:?}")
        })
}

/// Copy of `index` with the timestamp zeroed, for equality checks.
pub fn without_timestamp(index: &Index) -> Index {
    let mut index = index.clone();
    index.indexed_at = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
    index
}
