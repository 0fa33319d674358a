use anyhow::Result;
use symdex::config::IndexerConfig;
use symdex::walker::Walker;

use crate::helpers::TestHarness;

const UNIT: &str = "local/tree";

fn walker(harness: &TestHarness) -> Walker {
    Walker::new(harness.source_root(), &IndexerConfig::default())
}

#[test]
fn test_walk_index_edit_reindex() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.create_test_file("src/app.py", "def start():\n    pass\n")?;
    harness.create_test_file("src/lib.rs", "pub struct Engine;\n")?;
    harness.create_test_file("node_modules/dep/index.js", "function dep() {}\n")?;
    harness.create_test_file("README.md", "# readme\n")?;

    let sources = walker(&harness).load_sources(harness.store.registry())?;
    let paths: Vec<_> = sources.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, ["src/app.py", "src/lib.rs"]);

    let built = harness.store.build_full(UNIT, &sources, None)?;
    assert_eq!(built.index.language_counts["python"], 1);
    assert_eq!(built.index.language_counts["rust"], 1);

    harness.create_test_file("src/app.py", "def start():\n    pass\n\ndef stop():\n    pass\n")?;
    harness.create_test_file("src/util.py", "LIMIT = 5\n")?;

    let sources = walker(&harness).load_sources(harness.store.registry())?;
    let changes = harness.store.detect_changes(UNIT, &sources)?;
    assert_eq!(changes.changed, ["src/app.py"]);
    assert_eq!(changes.new, ["src/util.py"]);
    assert!(changes.deleted.is_empty());

    let merged = harness.store.merge_incremental(UNIT, changes.into_batch(sources.clone()), None)?;
    let ids: Vec<_> = merged.index.symbols.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        ["src-app.py::start", "src-app.py::stop", "src-lib.rs::Engine", "src-util.py::LIMIT"]
    );
    assert!(harness.store.detect_changes(UNIT, &sources)?.is_empty());
    Ok(())
}

#[test]
fn test_deleted_file_leaves_index() -> Result<()> {
    let harness = TestHarness::new()?;
    let doomed = harness.create_test_file("a.py", "def a():\n    pass\n")?;
    harness.create_test_file("b.py", "def b():\n    pass\n")?;

    let sources = walker(&harness).load_sources(harness.store.registry())?;
    harness.store.build_full(UNIT, &sources, None)?;

    std::fs::remove_file(doomed)?;
    let sources = walker(&harness).load_sources(harness.store.registry())?;
    let changes = harness.store.detect_changes(UNIT, &sources)?;
    assert_eq!(changes.deleted, ["a.py"]);

    let merged = harness.store.merge_incremental(UNIT, changes.into_batch(sources), None)?;
    assert_eq!(merged.index.source_files, ["b.py"]);
    let err = harness.store.read_symbol_content(UNIT, "a.py::a").unwrap_err();
    assert!(matches!(err, symdex::IndexError::SymbolNotFound(_)));
    Ok(())
}
