//! In-memory lookup tables over a symbol list.

use std::collections::HashMap;

use tracing::debug;

use super::Symbol;

/// Borrowing lookup structure for fast ID and per-file access.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    /// Index by symbol ID
    by_id: HashMap<&'a str, &'a Symbol>,
    /// Index by file path, in extraction order
    by_file: HashMap<&'a str, Vec<&'a Symbol>>,
    /// Index by plain name
    by_name: HashMap<&'a str, Vec<&'a Symbol>>,
}

impl<'a> SymbolTable<'a> {
    /// Build the table from symbols loaded from an index.
    pub fn new(symbols: &'a [Symbol]) -> Self {
        let mut table = Self::default();
        for symbol in symbols {
            table.by_id.insert(&symbol.id, symbol);
            table.by_file.entry(&symbol.file).or_default().push(symbol);
            table.by_name.entry(&symbol.name).or_default().push(symbol);
        }

        debug!(
            "Built symbol table with {} symbols across {} files",
            table.by_id.len(),
            table.by_file.len()
        );

        table
    }

    /// Find a symbol by ID.
    pub fn get(&self, id: &str) -> Option<&'a Symbol> {
        self.by_id.get(id).copied()
    }

    /// All symbols declared in a file, in extraction order.
    pub fn in_file(&self, file: &str) -> &[&'a Symbol] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    /// Find symbols by exact name.
    pub fn find_by_name(&self, name: &str) -> &[&'a Symbol] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;

    fn symbol(file: &str, name: &str) -> Symbol {
        Symbol {
            id: format!("{file}::{name}"),
            file: file.to_string(),
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind: SymbolKind::Function,
            language: "python".to_string(),
            signature: format!("def {name}()"),
            documentation: String::new(),
            summary: String::new(),
            attributes: Vec::new(),
            keywords: Vec::new(),
            parent_id: None,
            start_line: 1,
            end_line: 2,
            byte_offset: 0,
            byte_length: 10,
        }
    }

    #[test]
    fn test_symbol_table_basic() {
        let symbols = vec![
            symbol("a.py", "load"),
            symbol("a.py", "save"),
            symbol("b.py", "load"),
        ];
        let table = SymbolTable::new(&symbols);

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("a.py::save").map(|s| s.name.as_str()), Some("save"));
        assert!(table.get("c.py::save").is_none());
        assert_eq!(table.in_file("a.py").len(), 2);
        assert!(table.in_file("missing.py").is_empty());
        assert_eq!(table.find_by_name("load").len(), 2);
    }

    #[test]
    fn test_empty_table() {
        let table = SymbolTable::new(&[]);
        assert!(table.is_empty());
        assert!(table.find_by_name("x").is_empty());
    }
}
