use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use symdex::config::StorageConfig;
use symdex::indexing::SourceFile;
use symdex::language::ProfileRegistry;
use symdex::IndexStore;
use tempfile::TempDir;

/// A store and a scratch source tree in one temporary directory.
pub struct TestHarness {
    pub temp_dir: TempDir,
    pub store: IndexStore,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        Self::with_config(StorageConfig::default())
    }

    pub fn with_config(config: StorageConfig) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store = IndexStore::open(
            temp_dir.path().join("store"),
            Arc::new(ProfileRegistry::builtin()),
            &config,
        )?
        .with_threads(Some(2));

        Ok(Self { temp_dir, store })
    }

    /// Write a file under the scratch source tree.
    pub fn create_test_file(&self, path: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.source_root().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn source_root(&self) -> PathBuf {
        self.temp_dir.path().join("src_tree")
    }
}

pub fn python(path: &str, content: &str) -> SourceFile {
    SourceFile::new(path, content, "python")
}
