use std::fs;
use std::sync::Arc;

use anyhow::Result;
use symdex::config::StorageConfig;
use symdex::indexing::SourceFile;
use symdex::language::ProfileRegistry;
use symdex::storage::MergeBatch;
use symdex::{IndexError, IndexStore};

use crate::helpers::test_harness::python;
use crate::helpers::test_utils::without_timestamp;
use crate::helpers::TestHarness;

const UNIT: &str = "local/demo";

fn initial_files() -> Vec<SourceFile> {
    vec![
        python("pkg/a.py", "def alpha():\n    \"\"\"First.\"\"\"\n    return 1\n"),
        python("pkg/b.py", "class Beta:\n    def run(self):\n        pass\n"),
        python("c.py", "GAMMA = 3\n"),
    ]
}

#[test]
fn test_detect_and_merge_replace_only_edited_file() -> Result<()> {
    let harness = TestHarness::new()?;
    let store = &harness.store;
    let built = store.build_full(UNIT, &initial_files(), None)?;

    let mut current = initial_files();
    current[1] = python("pkg/b.py", "class Beta:\n    def stop(self):\n        pass\n");

    let changes = store.detect_changes(UNIT, &current)?;
    assert_eq!(changes.changed, ["pkg/b.py"]);
    assert!(changes.new.is_empty());
    assert!(changes.deleted.is_empty());

    let merged = store.merge_incremental(UNIT, changes.into_batch(current), None)?;
    let ids: Vec<_> = merged.index.symbols.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["c.py::GAMMA", "pkg-a.py::alpha", "pkg-b.py::Beta", "pkg-b.py::Beta.stop"]);

    // Untouched files keep their records exactly.
    let old_alpha = built.index.symbols.iter().find(|s| s.name == "alpha").unwrap();
    let new_alpha = merged.index.symbols.iter().find(|s| s.name == "alpha").unwrap();
    assert_eq!(old_alpha, new_alpha);
    assert_eq!(built.index.file_hashes["pkg/a.py"], merged.index.file_hashes["pkg/a.py"]);
    assert_ne!(built.index.file_hashes["pkg/b.py"], merged.index.file_hashes["pkg/b.py"]);
    Ok(())
}

#[test]
fn test_incremental_merge_equals_full_rebuild() -> Result<()> {
    let incremental = TestHarness::new()?;
    let full = TestHarness::new()?;

    incremental.store.build_full(UNIT, &initial_files(), None)?;

    let final_files = vec![
        python("pkg/a.py", "def alpha():\n    return 2\n"),
        python("pkg/b.py", "class Beta:\n    def run(self):\n        pass\n"),
        python("d.py", "def delta():\n    pass\n"),
    ];
    let changes = incremental.store.detect_changes(UNIT, &final_files)?;
    assert_eq!(changes.changed, ["pkg/a.py"]);
    assert_eq!(changes.new, ["d.py"]);
    assert_eq!(changes.deleted, ["c.py"]);

    let merged = incremental
        .store
        .merge_incremental(UNIT, changes.into_batch(final_files.clone()), None)?;
    let rebuilt = full.store.build_full(UNIT, &final_files, None)?;

    assert_eq!(without_timestamp(&merged.index), without_timestamp(&rebuilt.index));
    assert_eq!(merged.index.language_counts["python"], 3);
    Ok(())
}

#[test]
fn test_merge_without_index_builds_from_scratch() -> Result<()> {
    let harness = TestHarness::new()?;
    let batch = MergeBatch {
        new: initial_files(),
        ..MergeBatch::default()
    };

    let outcome = harness.store.merge_incremental(UNIT, batch, Some("abc"))?;
    assert_eq!(outcome.generation, 1);
    assert_eq!(outcome.index.source_files, ["c.py", "pkg/a.py", "pkg/b.py"]);
    assert_eq!(outcome.index.source_revision.as_deref(), Some("abc"));
    Ok(())
}

#[test]
fn test_merge_keeps_previous_revision() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.store.build_full(UNIT, &initial_files(), Some("r1"))?;

    let batch = MergeBatch {
        deleted: vec!["c.py".to_string()],
        ..MergeBatch::default()
    };
    let merged = harness.store.merge_incremental(UNIT, batch, None)?;
    assert_eq!(merged.index.source_revision.as_deref(), Some("r1"));

    let relabelled = harness
        .store
        .merge_incremental(UNIT, MergeBatch::default(), Some("r2"))?;
    assert_eq!(relabelled.index.source_revision.as_deref(), Some("r2"));
    assert_eq!(relabelled.index.symbols, merged.index.symbols);
    Ok(())
}

#[test]
fn test_symbol_content_round_trip() -> Result<()> {
    let harness = TestHarness::new()?;
    let files = vec![
        python("pkg/a.py", "import os\n\n@cache\ndef alpha(x):\n    return x\n\nLIMIT = 10\n"),
        SourceFile::new("lib.rs", "/// Doc.\npub fn beta() -> u8 {\n    1\n}\n", "rust"),
        SourceFile::new("app.js", "// Adds.\nexport const add = (a, b) => a + b;\n", "javascript"),
    ];
    let outcome = harness.store.build_full(UNIT, &files, None)?;
    assert_eq!(outcome.index.symbols.len(), 4);

    for symbol in &outcome.index.symbols {
        let bytes = harness.store.read_symbol_content(UNIT, &symbol.id)?;
        let text = String::from_utf8(bytes)?;
        assert!(
            text.trim_start().starts_with(&symbol.signature),
            "{} does not start with {:?}: {:?}",
            symbol.id,
            symbol.signature,
            text
        );
    }
    Ok(())
}

#[test]
fn test_missing_content_is_distinct_from_missing_symbol() -> Result<()> {
    let harness = TestHarness::new()?;
    let outcome = harness.store.build_full(UNIT, &initial_files(), None)?;

    let err = harness.store.read_symbol_content(UNIT, "pkg-a.py::nope").unwrap_err();
    assert!(matches!(err, IndexError::SymbolNotFound(_)));

    let err = harness.store.read_symbol_content("local/other", "pkg-a.py::alpha").unwrap_err();
    assert!(matches!(err, IndexError::UnitNotFound(_)));

    let layout = harness.store.layout(UNIT)?;
    fs::remove_file(layout.content_path(outcome.generation, "pkg/a.py"))?;
    let err = harness.store.read_symbol_content(UNIT, "pkg-a.py::alpha").unwrap_err();
    match err {
        IndexError::ContentMissing { unit, path } => {
            assert_eq!(unit, UNIT);
            assert_eq!(path, "pkg/a.py");
        }
        other => panic!("expected ContentMissing, got {other:?}"),
    }

    // The symbol itself is still there.
    assert!(harness.store.get_symbol(UNIT, "pkg-a.py::alpha")?.is_some());
    Ok(())
}

#[test]
fn test_newer_schema_loads_as_absent() -> Result<()> {
    let harness = TestHarness::new()?;
    let outcome = harness.store.build_full(UNIT, &initial_files(), None)?;

    let path = harness.store.layout(UNIT)?.index_path(outcome.generation);
    let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    json["schema_version"] = serde_json::json!(99);
    fs::write(&path, serde_json::to_vec(&json)?)?;

    assert!(harness.store.load(UNIT)?.is_none());
    assert!(harness.store.list()?.is_empty());

    // Everything is new again, so the next index run rebuilds.
    let changes = harness.store.detect_changes(UNIT, &initial_files())?;
    assert_eq!(changes.new.len(), 3);
    Ok(())
}

#[test]
fn test_version_one_index_is_backfilled() -> Result<()> {
    let harness = TestHarness::new()?;
    let outcome = harness.store.build_full(UNIT, &initial_files(), None)?;

    let path = harness.store.layout(UNIT)?.index_path(outcome.generation);
    let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    let record = json.as_object_mut().unwrap();
    record.insert("schema_version".to_string(), serde_json::json!(1));
    record.remove("file_hashes");
    record.remove("files");
    record.remove("source_revision");
    fs::write(&path, serde_json::to_vec(&json)?)?;

    let loaded = harness.store.load(UNIT)?.unwrap();
    assert_eq!(loaded.schema_version, symdex::storage::SCHEMA_VERSION);
    assert_eq!(loaded.file_hashes, outcome.index.file_hashes);
    assert_eq!(loaded.files, outcome.index.files);
    assert!(harness.store.detect_changes(UNIT, &initial_files())?.is_empty());
    Ok(())
}

#[test]
fn test_failed_commit_keeps_previous_generation() -> Result<()> {
    let harness = TestHarness::new()?;
    let built = harness.store.build_full(UNIT, &initial_files(), None)?;

    let batch = MergeBatch {
        new: vec![python("../escape.py", "def out():\n    pass\n")],
        ..MergeBatch::default()
    };
    let err = harness.store.merge_incremental(UNIT, batch, None).unwrap_err();
    assert!(matches!(err, IndexError::WriteFailure { .. }));

    let layout = harness.store.layout(UNIT)?;
    assert_eq!(layout.current_generation()?, Some(built.generation));
    assert_eq!(harness.store.load(UNIT)?.unwrap(), built.index);

    let leftovers: Vec<_> = fs::read_dir(layout.dir())?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".staging-"))
        .collect();
    assert!(leftovers.is_empty());
    Ok(())
}

#[test]
fn test_old_generations_are_pruned() -> Result<()> {
    let harness = TestHarness::with_config(StorageConfig {
        retained_generations: 2,
        ..StorageConfig::default()
    })?;

    for round in 0..4 {
        let files = vec![python("a.py", &format!("ROUND = {round}\n"))];
        harness.store.build_full(UNIT, &files, None)?;
    }

    let layout = harness.store.layout(UNIT)?;
    assert_eq!(layout.generations()?, [3, 4]);
    assert_eq!(layout.current_generation()?, Some(4));
    let signature = &harness.store.load(UNIT)?.unwrap().symbols[0].signature;
    assert_eq!(signature, "ROUND = 3");
    Ok(())
}

#[test]
fn test_list_and_delete() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.store.build_full("local/zeta", &initial_files(), None)?;
    harness.store.build_full("github/acme/alpha", &initial_files()[..1], Some("deadbeef"))?;

    let units = harness.store.list()?;
    let keys: Vec<_> = units.iter().map(|u| u.unit_key.as_str()).collect();
    assert_eq!(keys, ["github/acme/alpha", "local/zeta"]);
    assert_eq!(units[0].file_count, 1);
    assert_eq!(units[0].source_revision.as_deref(), Some("deadbeef"));
    assert_eq!(units[1].symbol_count, 4);

    assert!(harness.store.delete("local/zeta")?);
    assert!(!harness.store.delete("local/zeta")?);
    assert!(harness.store.load("local/zeta")?.is_none());
    assert_eq!(harness.store.list()?.len(), 1);
    Ok(())
}

#[test]
fn test_summaries_are_filled_before_commit() -> Result<()> {
    let harness = TestHarness::new()?;
    let index = harness.store.build_full(UNIT, &initial_files(), None)?.index;
    let summaries: Vec<_> = index.symbols.iter().map(|s| s.summary.as_str()).collect();
    assert_eq!(
        summaries,
        ["Constant GAMMA", "First.", "Class Beta", "def run(self)"]
    );
    Ok(())
}

#[test]
fn test_readers_see_whole_generations_during_writes() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.store.build_full(UNIT, &initial_files(), None)?;

    std::thread::scope(|scope| {
        let writer = scope.spawn(|| {
            for round in 0..5 {
                let batch = MergeBatch {
                    changed: vec![python("c.py", &format!("GAMMA = {round}\n"))],
                    ..MergeBatch::default()
                };
                harness.store.merge_incremental(UNIT, batch, None).unwrap();
            }
        });

        while !writer.is_finished() {
            let index = harness.store.load(UNIT).unwrap().unwrap();
            index.validate().unwrap();
            assert_eq!(index.source_files.len(), 3);
        }
    });
    Ok(())
}

#[test]
fn test_unit_keys_cannot_escape_the_store() -> Result<()> {
    let harness = TestHarness::new()?;
    let sentinel = harness.temp_dir.path().join("sentinel.txt");
    fs::write(&sentinel, "keep me")?;
    harness.store.build_full(UNIT, &initial_files(), None)?;

    for key in ["..", ".", ""] {
        let err = harness.store.delete(key).unwrap_err();
        assert!(matches!(err, IndexError::InvalidUnitKey(_)), "delete({key:?}): {err:?}");

        let err = harness.store.build_full(key, &initial_files(), None).unwrap_err();
        assert!(matches!(err, IndexError::InvalidUnitKey(_)));

        let err = harness
            .store
            .merge_incremental(key, MergeBatch::default(), None)
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidUnitKey(_)));

        assert!(matches!(harness.store.load(key), Err(IndexError::InvalidUnitKey(_))));
    }

    assert!(sentinel.is_file());
    assert!(harness.store.root().join("CURRENT").symlink_metadata().is_err());
    assert!(harness.store.load(UNIT)?.is_some());
    Ok(())
}

#[test]
fn test_writers_from_separate_handles_are_serialized() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.store.build_full(UNIT, &initial_files(), None)?;

    let open = || -> Result<IndexStore> {
        Ok(IndexStore::open(
            harness.store.root(),
            Arc::new(ProfileRegistry::builtin()),
            &StorageConfig::default(),
        )?
        .with_threads(Some(1)))
    };
    let first = open()?;
    let second = open()?;
    const ROUNDS: usize = 8;

    std::thread::scope(|scope| {
        for (store, prefix) in [(&first, "left"), (&second, "right")] {
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let batch = MergeBatch {
                        new: vec![python(&format!("{prefix}/m{round}.py"), "def f():\n    pass\n")],
                        ..MergeBatch::default()
                    };
                    store.merge_incremental(UNIT, batch, None).unwrap();
                }
            });
        }
    });

    let (generation, index) = harness.store.load_generation(UNIT)?.unwrap();
    assert_eq!(generation, 1 + 2 * ROUNDS as u64);
    assert_eq!(index.source_files.len(), 3 + 2 * ROUNDS);
    index.validate()?;

    let names: Vec<String> = fs::read_dir(harness.store.layout(UNIT)?.dir())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    assert!(!names.iter().any(|n| n == "LOCK" || n.ends_with(".tmp")), "{names:?}");
    Ok(())
}
