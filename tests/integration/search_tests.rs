use anyhow::Result;
use symdex::indexing::SourceFile;
use symdex::symbol::{search, SearchQuery, SymbolKind};
use symdex::IndexError;

use crate::helpers::test_harness::python;
use crate::helpers::TestHarness;

const UNIT: &str = "local/calc";

fn calculator() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "src/math.js",
            "function add(a, b) {\n  return a + b;\n}\n\n\
             function addAll(items) {\n  return items.reduce((x, y) => x + y, 0);\n}\n\n\
             function subtract(a, b) {\n  return a - b;\n}\n",
            "javascript",
        ),
        python(
            "src/main.py",
            "class Calculator:\n    \"\"\"Keeps a running total.\"\"\"\n\n    def add(self, value):\n        self.total += value\n",
        ),
        python("tools/main.py", "def run():\n    pass\n"),
    ]
}

#[test]
fn test_exact_name_ranks_first_and_misses_are_dropped() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &calculator(), None)?.index;

    let query = SearchQuery::new("add").with_path_glob("*.js");
    let hits = search(&index, &query)?;
    let names: Vec<_> = hits.iter().map(|h| h.symbol.name.as_str()).collect();
    assert_eq!(names, ["add", "addAll"]);
    assert!(hits[0].score > hits[1].score);
    Ok(())
}

#[test]
fn test_kind_filter() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &calculator(), None)?.index;

    let methods = search(&index, &SearchQuery::new("add").with_kind(SymbolKind::Method))?;
    let ids: Vec<_> = methods.iter().map(|h| h.symbol.id.as_str()).collect();
    assert_eq!(ids, ["src-main.py::Calculator.add"]);

    let classes = search(&index, &SearchQuery::new("running total").with_kind(SymbolKind::Class))?;
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].symbol.name, "Calculator");
    Ok(())
}

#[test]
fn test_path_glob_matches_nested_files() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &calculator(), None)?.index;

    let hits = search(&index, &SearchQuery::new("run").with_path_glob("main.py"))?;
    let files: Vec<_> = hits.iter().map(|h| h.symbol.file.as_str()).collect();
    assert!(files.contains(&"tools/main.py"));
    assert!(files.iter().all(|f| f.ends_with("main.py")));

    let hits = search(&index, &SearchQuery::new("run").with_path_glob("src/*"))?;
    assert!(hits.iter().all(|h| h.symbol.file.starts_with("src/")));
    Ok(())
}

#[test]
fn test_invalid_glob_is_an_error() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &calculator(), None)?.index;

    let err = search(&index, &SearchQuery::new("add").with_path_glob("src/[")).unwrap_err();
    assert!(matches!(err, IndexError::InvalidGlob { .. }));
    Ok(())
}

#[test]
fn test_results_are_stable_across_reloads() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.store.build_full(UNIT, &calculator(), None)?;

    let query = SearchQuery::new("add total").with_max_results(3);
    let first = harness.store.load(UNIT)?.unwrap();
    let second = harness.store.load(UNIT)?.unwrap();

    let a: Vec<_> = search(&first, &query)?.iter().map(|h| (h.symbol.id.clone(), h.score)).collect();
    let b: Vec<_> = search(&second, &query)?.iter().map(|h| (h.symbol.id.clone(), h.score)).collect();
    assert_eq!(a, b);
    assert!(a.len() <= 3);
    Ok(())
}
