//! Change detection against a committed index.

use std::collections::BTreeSet;

use serde::Serialize;

use super::model::Index;
use crate::indexing::SourceFile;

/// Paths that differ between a file listing and the committed index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Indexed, but the content hash differs
    pub changed: Vec<String>,
    /// Not indexed yet
    pub new: Vec<String>,
    /// Indexed, but absent from the listing
    pub deleted: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.new.is_empty() && self.deleted.is_empty()
    }

    /// Split `files` into a merge batch following this change set.
    pub fn into_batch(self, files: Vec<SourceFile>) -> MergeBatch {
        let changed: BTreeSet<&str> = self.changed.iter().map(String::as_str).collect();
        let new: BTreeSet<&str> = self.new.iter().map(String::as_str).collect();

        let mut batch = MergeBatch::default();
        for file in files {
            if changed.contains(file.path.as_str()) {
                batch.changed.push(file);
            } else if new.contains(file.path.as_str()) {
                batch.new.push(file);
            }
        }
        batch.deleted = self.deleted;
        batch
    }
}

/// Input to an incremental merge.
#[derive(Debug, Clone, Default)]
pub struct MergeBatch {
    pub changed: Vec<SourceFile>,
    pub new: Vec<SourceFile>,
    pub deleted: Vec<String>,
}

impl MergeBatch {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.new.is_empty() && self.deleted.is_empty()
    }
}

/// Compare `current` against `index`. With no index every file is new.
pub fn compare(index: Option<&Index>, current: &[SourceFile]) -> ChangeSet {
    let mut changes = ChangeSet::default();

    let Some(index) = index else {
        changes.new = current.iter().map(|f| f.path.clone()).collect();
        changes.new.sort();
        changes.new.dedup();
        return changes;
    };

    let mut seen = BTreeSet::new();
    for file in current {
        if !seen.insert(file.path.as_str()) {
            continue;
        }
        match index.file_hashes.get(&file.path) {
            Some(hash) if *hash == file.hash() => {}
            Some(_) => changes.changed.push(file.path.clone()),
            None if index.source_files.binary_search(&file.path).is_ok() => {
                changes.changed.push(file.path.clone())
            }
            None => changes.new.push(file.path.clone()),
        }
    }

    changes.deleted = index
        .source_files
        .iter()
        .filter(|path| !seen.contains(path.as_str()))
        .cloned()
        .collect();

    changes.changed.sort();
    changes.new.sort();
    changes
}
