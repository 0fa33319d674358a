use std::fs;

use anyhow::Result;
use symdex::query::{file_outline, file_tree, get_symbols, SymbolLookup, TreeNode};
use symdex::IndexError;

use crate::helpers::test_harness::python;
use crate::helpers::TestHarness;

const UNIT: &str = "local/shop";

fn shop() -> Vec<symdex::indexing::SourceFile> {
    vec![
        python(
            "shop/cart.py",
            "class Cart:\n    def add(self, item):\n        pass\n\n    def total(self):\n        return 0\n",
        ),
        python("shop/__init__.py", ""),
        python("main.py", "def main():\n    pass\n"),
    ]
}

#[test]
fn test_get_symbols_reports_each_id() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.store.build_full(UNIT, &shop(), None)?;

    let ids = vec!["shop-cart.py::Cart.total".to_string(), "shop-cart.py::Cart.pay".to_string()];
    let lookups = get_symbols(&harness.store, UNIT, &ids)?;
    assert_eq!(lookups.len(), 2);

    match &lookups[0] {
        SymbolLookup::Found { symbol, source } => {
            assert_eq!(symbol.kind.as_str(), "method");
            assert_eq!(source, "def total(self):\n        return 0");
        }
        other => panic!("expected Found, got {other:?}"),
    }
    match &lookups[1] {
        SymbolLookup::NotFound { id, .. } => assert_eq!(id, "shop-cart.py::Cart.pay"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    let json = serde_json::to_value(&lookups)?;
    assert_eq!(json[0]["status"], "found");
    assert_eq!(json[1]["status"], "not_found");
    Ok(())
}

#[test]
fn test_get_symbols_with_missing_content() -> Result<()> {
    let harness = TestHarness::new()?;
    let outcome = harness.store.build_full(UNIT, &shop(), None)?;
    fs::remove_file(harness.store.layout(UNIT)?.content_path(outcome.generation, "main.py"))?;

    let lookups = get_symbols(&harness.store, UNIT, &["main.py::main".to_string()])?;
    assert!(matches!(lookups[0], SymbolLookup::NotFound { .. }));
    Ok(())
}

#[test]
fn test_get_symbols_unknown_unit() -> Result<()> {
    let harness = TestHarness::new()?;
    let err = get_symbols(&harness.store, "local/none", &["a.py::f".to_string()]).unwrap_err();
    assert!(matches!(err, IndexError::UnitNotFound(_)));
    Ok(())
}

#[test]
fn test_outline_from_stored_index() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &shop(), None)?.index;

    let outline = file_outline(&index, "shop/cart.py")?.unwrap();
    assert_eq!(outline.len(), 1);
    let members: Vec<_> = outline[0].children.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(members, ["add", "total"]);
    assert_eq!((outline[0].start_line, outline[0].end_line), (1, 6));

    assert!(file_outline(&index, "shop/__init__.py")?.unwrap().is_empty());
    Ok(())
}

#[test]
fn test_tree_from_stored_index() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &shop(), None)?.index;

    let tree = file_tree(&index, "");
    let top: Vec<_> = tree.iter().map(TreeNode::path).collect();
    assert_eq!(top, ["shop", "main.py"]);

    let TreeNode::Dir { children, .. } = &tree[0] else {
        panic!("expected a directory");
    };
    let counts: Vec<_> = children
        .iter()
        .map(|node| match node {
            TreeNode::File { path, symbol_count, .. } => (path.as_str(), *symbol_count),
            TreeNode::Dir { path, .. } => (path.as_str(), usize::MAX),
        })
        .collect();
    assert_eq!(counts, [("shop/__init__.py", 0), ("shop/cart.py", 3)]);

    let json = serde_json::to_value(&tree)?;
    assert_eq!(json[0]["type"], "dir");
    assert_eq!(json[1]["type"], "file");
    Ok(())
}
