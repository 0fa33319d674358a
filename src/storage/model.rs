//! Persisted index records.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::indexing::{content_hash, line_count, FileExtraction};
use crate::language::ProfileRegistry;
use crate::symbol::{Symbol, SymbolTable};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 2;

/// Per-file metadata (schema v2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub language: String,
    pub line_count: usize,
    pub byte_len: usize,
}

/// The persisted index of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub unit_key: String,
    pub schema_version: u32,
    /// Commit hash or similar, when the source has one
    #[serde(default)]
    pub source_revision: Option<String>,
    pub indexed_at: DateTime<Utc>,
    /// Sorted, unique
    pub source_files: Vec<String>,
    /// Number of files per language
    #[serde(default)]
    pub language_counts: BTreeMap<String, usize>,
    /// BLAKE3 hex digest per file
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,
    #[serde(default)]
    pub files: BTreeMap<String, FileMeta>,
    /// Grouped by file in `source_files` order
    pub symbols: Vec<Symbol>,
}

/// Just enough of `index.json` to gate on the schema version.
#[derive(Debug, Deserialize)]
pub(crate) struct IndexHeader {
    pub schema_version: u32,
}

/// Listing entry for a stored unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub unit_key: String,
    pub indexed_at: DateTime<Utc>,
    pub source_revision: Option<String>,
    pub generation: u64,
    pub file_count: usize,
    pub symbol_count: usize,
    pub language_counts: BTreeMap<String, usize>,
}

impl Index {
    /// An index with no files.
    pub fn empty(unit_key: &str) -> Self {
        Self {
            unit_key: unit_key.to_string(),
            schema_version: SCHEMA_VERSION,
            source_revision: None,
            indexed_at: Utc::now(),
            source_files: Vec::new(),
            language_counts: BTreeMap::new(),
            file_hashes: BTreeMap::new(),
            files: BTreeMap::new(),
            symbols: Vec::new(),
        }
    }

    /// Assemble an index from per-file results. Input order is irrelevant;
    /// files are placed in path order and the first of duplicate paths wins.
    pub fn from_extractions(unit_key: &str, revision: Option<String>, mut files: Vec<FileExtraction>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|later, earlier| later.path == earlier.path);

        let mut index = Self::empty(unit_key);
        index.source_revision = revision;

        for file in files {
            *index.language_counts.entry(file.language.clone()).or_insert(0) += 1;
            index.file_hashes.insert(file.path.clone(), file.hash);
            index.files.insert(
                file.path.clone(),
                FileMeta {
                    language: file.language,
                    line_count: file.line_count,
                    byte_len: file.byte_len,
                },
            );
            index.symbols.extend(file.symbols);
            index.source_files.push(file.path);
        }

        index
    }

    /// Split back into per-file results, in `source_files` order.
    pub fn into_file_extractions(self) -> Vec<FileExtraction> {
        let mut by_file: BTreeMap<String, Vec<Symbol>> = BTreeMap::new();
        for symbol in self.symbols {
            by_file.entry(symbol.file.clone()).or_default().push(symbol);
        }

        self.source_files
            .into_iter()
            .map(|path| {
                let meta = self.files.get(&path);
                FileExtraction {
                    language: meta.map(|m| m.language.clone()).unwrap_or_default(),
                    hash: self.file_hashes.get(&path).cloned().unwrap_or_default(),
                    line_count: meta.map_or(0, |m| m.line_count),
                    byte_len: meta.map_or(0, |m| m.byte_len),
                    symbols: by_file.remove(&path).unwrap_or_default(),
                    path,
                }
            })
            .collect()
    }

    /// Check the structural invariants between files and symbols.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |reason: String| IndexError::InconsistentIndex {
            unit: self.unit_key.clone(),
            reason,
        };

        if self.source_files.windows(2).any(|w| w[0] >= w[1]) {
            return Err(inconsistent("source files are not sorted and unique".into()));
        }

        let files: BTreeSet<&str> = self.source_files.iter().map(String::as_str).collect();
        if let Some(symbol) = self.symbols.iter().find(|s| !files.contains(s.file.as_str())) {
            return Err(inconsistent(format!("{} belongs to unindexed file {}", symbol.id, symbol.file)));
        }
        if !self.file_hashes.keys().map(String::as_str).eq(files.iter().copied()) {
            return Err(inconsistent("file hashes do not match source files".into()));
        }
        if !self.files.keys().map(String::as_str).eq(files.iter().copied()) {
            return Err(inconsistent("file metadata does not match source files".into()));
        }

        Ok(())
    }

    /// Lookup tables over the symbols.
    pub fn symbol_table(&self) -> SymbolTable<'_> {
        SymbolTable::new(&self.symbols)
    }

    pub fn summary(&self, generation: u64) -> UnitSummary {
        UnitSummary {
            unit_key: self.unit_key.clone(),
            indexed_at: self.indexed_at,
            source_revision: self.source_revision.clone(),
            generation,
            file_count: self.source_files.len(),
            symbol_count: self.symbols.len(),
            language_counts: self.language_counts.clone(),
        }
    }

    /// Fill in what version-1 records lack, from the backing content.
    ///
    /// Hashes and line counts come from `content_dir`; the language comes from
    /// the file's symbols, else from its extension. A missing backing file
    /// gets an empty hash so that change detection reports it as changed.
    pub(crate) fn backfill(&mut self, content_dir: &Path, registry: &ProfileRegistry) {
        let mut languages: BTreeMap<&str, &str> = BTreeMap::new();
        for symbol in &self.symbols {
            languages.entry(&symbol.file).or_insert(&symbol.language);
        }

        let mut hashes = BTreeMap::new();
        let mut metas = BTreeMap::new();
        for path in &self.source_files {
            let language = languages
                .get(path.as_str())
                .map(|l| l.to_string())
                .or_else(|| registry.detect_language(path).map(str::to_string))
                .unwrap_or_default();

            let (hash, meta) = match fs::read(content_dir.join(path)) {
                Ok(bytes) => (
                    content_hash(&bytes),
                    FileMeta {
                        language,
                        line_count: line_count(&bytes),
                        byte_len: bytes.len(),
                    },
                ),
                Err(e) => {
                    debug!("No backing content for {} during backfill: {}", path, e);
                    (
                        String::new(),
                        FileMeta {
                            language,
                            line_count: 0,
                            byte_len: 0,
                        },
                    )
                }
            };
            hashes.insert(path.clone(), hash);
            metas.insert(path.clone(), meta);
        }

        if self.language_counts.is_empty() {
            for meta in metas.values().filter(|m| !m.language.is_empty()) {
                *self.language_counts.entry(meta.language.clone()).or_insert(0) += 1;
            }
        }
        self.file_hashes = hashes;
        self.files = metas;
        self.schema_version = SCHEMA_VERSION;
    }
}
