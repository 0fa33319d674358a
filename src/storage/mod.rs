//! Persistent, generation-based index store.
//!
//! Every build or merge writes a complete new generation and publishes it by
//! swapping the unit's `CURRENT` pointer. Readers resolve the pointer once and
//! never observe a partial write. Writers to the same unit are serialized by a
//! per-unit lock; readers take no lock.

pub mod changes;
pub mod generation;
pub mod model;

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

pub use changes::{ChangeSet, MergeBatch};
pub use generation::UnitLayout;
pub use model::{FileMeta, Index, UnitSummary, SCHEMA_VERSION};

use crate::config::StorageConfig;
use crate::error::{IndexError, Result};
use crate::indexing::{ErrorReport, FileExtraction, ParallelIndexer, SourceFile};
use crate::language::ProfileRegistry;
use crate::summarizer::{summarize_missing, HeuristicSummarizer, Summarizer};
use crate::symbol::Symbol;
use generation::{Staging, WriteLock};
use model::IndexHeader;

/// Attempts at resolving `CURRENT` when a concurrent prune removes the
/// generation it named.
const LOAD_ATTEMPTS: usize = 3;

/// How long a writer waits for another process writing the same unit.
const WRITE_LOCK_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of a build or merge.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The committed index
    pub index: Index,
    /// Generation the index was committed as
    pub generation: u64,
    /// Files and declarations skipped while extracting
    pub report: ErrorReport,
}

/// Index store rooted at one directory, holding any number of units.
pub struct IndexStore {
    root: PathBuf,
    registry: Arc<ProfileRegistry>,
    summarizer: Arc<dyn Summarizer>,
    threads: Option<usize>,
    show_progress: bool,
    retained_generations: usize,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IndexStore {
    /// Open (creating if needed) the store at `root`.
    pub fn open(root: impl Into<PathBuf>, registry: Arc<ProfileRegistry>, config: &StorageConfig) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("Opened index store at {:?}", root);

        Ok(Self {
            root,
            registry,
            summarizer: Arc::new(HeuristicSummarizer),
            threads: None,
            show_progress: false,
            retained_generations: config.retained_generations.max(1),
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the summarizer applied to symbols without a summary.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Extraction worker count; `None` uses one per CPU.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// On-disk layout of `unit`. Fails with `InvalidUnitKey` for keys that
    /// would not name a directory of their own under the root.
    pub fn layout(&self, unit: &str) -> Result<UnitLayout> {
        UnitLayout::new(&self.root, unit)
    }

    /// Extract every file and commit the result as the unit's new index.
    pub fn build_full(&self, unit: &str, files: &[SourceFile], revision: Option<&str>) -> Result<BuildOutcome> {
        let layout = self.layout(unit)?;
        let lock = self.unit_lock(unit);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _write_lock = self.write_lock(&layout, unit)?;

        self.build_locked(&layout, unit, files, revision.map(str::to_string))
    }

    /// Re-extract changed and new files, drop deleted ones and commit.
    ///
    /// Files outside the batch keep their symbols and backing content from
    /// the current generation. Without a committed index this is a full build
    /// over `changed` and `new`. `revision: None` keeps the previous revision.
    pub fn merge_incremental(&self, unit: &str, batch: MergeBatch, revision: Option<&str>) -> Result<BuildOutcome> {
        let layout = self.layout(unit)?;
        let lock = self.unit_lock(unit);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _write_lock = self.write_lock(&layout, unit)?;

        let MergeBatch { changed, new, deleted } = batch;
        let mut files = changed;
        files.extend(new);

        let Some((previous_generation, previous)) = self.load_current(&layout)? else {
            debug!("No committed index for {}, building from scratch", unit);
            return self.build_locked(&layout, unit, &files, revision.map(str::to_string));
        };

        let revision = revision
            .map(str::to_string)
            .or_else(|| previous.source_revision.clone());

        if files.is_empty() && deleted.is_empty() && revision == previous.source_revision {
            info!("{}: nothing to merge", unit);
            return Ok(BuildOutcome {
                index: previous,
                generation: previous_generation,
                report: ErrorReport::default(),
            });
        }

        let replaced: BTreeSet<&str> = files
            .iter()
            .map(|f| f.path.as_str())
            .chain(deleted.iter().map(String::as_str))
            .collect();
        let kept: Vec<FileExtraction> = previous
            .into_file_extractions()
            .into_iter()
            .filter(|f| !replaced.contains(f.path.as_str()))
            .collect();
        let kept_paths: Vec<String> = kept.iter().map(|f| f.path.clone()).collect();

        let (mut extracted, report) = self.indexer().extract_files(&files)?;
        report.log_summary();
        self.summarize(&mut extracted);
        let written: Vec<String> = extracted.iter().map(|f| f.path.clone()).collect();

        let mut all = kept;
        all.extend(extracted);
        let index = Index::from_extractions(unit, revision, all);

        let contents = content_map(&files);
        let generation = self.publish(&layout, &index, |staging| {
            for path in &kept_paths {
                let existing = layout.content_path(previous_generation, path);
                if existing.is_file() {
                    staging.link_content(path, &existing)?;
                } else {
                    warn!("{}: backing content for {} is missing, not carried over", unit, path);
                }
            }
            for path in &written {
                if let Some(bytes) = contents.get(path.as_str()) {
                    staging.write_content(path, bytes)?;
                }
            }
            Ok(())
        })?;

        info!(
            "{}: merged {} changed/new and {} deleted files into generation {}",
            unit,
            written.len(),
            deleted.len(),
            generation
        );

        Ok(BuildOutcome {
            index,
            generation,
            report,
        })
    }

    /// The committed index of `unit`.
    ///
    /// `None` when the unit was never indexed, or when its index was written
    /// by a newer schema and must be rebuilt.
    pub fn load(&self, unit: &str) -> Result<Option<Index>> {
        Ok(self.load_current(&self.layout(unit)?)?.map(|(_, index)| index))
    }

    /// Look up one symbol. Fails with `UnitNotFound` for an unknown unit.
    pub fn get_symbol(&self, unit: &str, id: &str) -> Result<Option<Symbol>> {
        let index = self
            .load(unit)?
            .ok_or_else(|| IndexError::UnitNotFound(unit.to_string()))?;
        Ok(index.symbols.into_iter().find(|s| s.id == id))
    }

    /// The committed index of `unit` together with its generation number.
    pub fn load_generation(&self, unit: &str) -> Result<Option<(u64, Index)>> {
        self.load_current(&self.layout(unit)?)
    }

    /// Exact source bytes of a symbol, read from the backing content.
    pub fn read_symbol_content(&self, unit: &str, id: &str) -> Result<Vec<u8>> {
        let (generation, index) = self
            .load_generation(unit)?
            .ok_or_else(|| IndexError::UnitNotFound(unit.to_string()))?;
        let symbol = index
            .symbol_table()
            .get(id)
            .ok_or_else(|| IndexError::SymbolNotFound(id.to_string()))?;
        self.read_content_at(unit, generation, symbol)
    }

    /// Source bytes of `symbol` as stored in `generation`.
    pub fn read_content_at(&self, unit: &str, generation: u64, symbol: &Symbol) -> Result<Vec<u8>> {
        read_range(
            &self.layout(unit)?.content_path(generation, &symbol.file),
            symbol.byte_offset as u64,
            symbol.byte_length,
        )
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::UnexpectedEof => IndexError::ContentMissing {
                unit: unit.to_string(),
                path: symbol.file.clone(),
            },
            _ => IndexError::Io(e),
        })
    }

    /// Remove the unit with all its generations. Returns whether it existed.
    pub fn delete(&self, unit: &str) -> Result<bool> {
        let layout = self.layout(unit)?;
        let lock = self.unit_lock(unit);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if !layout.exists() {
            return Ok(false);
        }
        let _write_lock = self.write_lock(&layout, unit)?;
        fs::remove_dir_all(layout.dir())?;
        info!("Deleted index for {}", unit);
        Ok(true)
    }

    /// Compare a file listing against the committed index.
    pub fn detect_changes(&self, unit: &str, files: &[SourceFile]) -> Result<ChangeSet> {
        let index = self.load(unit)?;
        Ok(changes::compare(index.as_ref(), files))
    }

    /// Every readable unit in the store, sorted by key.
    pub fn list(&self) -> Result<Vec<UnitSummary>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut units = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let layout = UnitLayout::at(entry.path());
            match self.load_current(&layout) {
                Ok(Some((generation, index))) => units.push(index.summary(generation)),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable unit at {:?}: {}", entry.path(), e),
            }
        }

        units.sort_by(|a, b| a.unit_key.cmp(&b.unit_key));
        Ok(units)
    }

    fn build_locked(
        &self,
        layout: &UnitLayout,
        unit: &str,
        files: &[SourceFile],
        revision: Option<String>,
    ) -> Result<BuildOutcome> {
        let (mut extracted, report) = self.indexer().extract_files(files)?;
        report.log_summary();
        self.summarize(&mut extracted);

        let index = Index::from_extractions(unit, revision, extracted);
        let contents = content_map(files);
        let generation = self.publish(layout, &index, |staging| {
            for path in &index.source_files {
                if let Some(bytes) = contents.get(path.as_str()) {
                    staging.write_content(path, bytes)?;
                }
            }
            Ok(())
        })?;

        info!(
            "{}: committed {} files, {} symbols as generation {}",
            unit,
            index.source_files.len(),
            index.symbols.len(),
            generation
        );

        Ok(BuildOutcome {
            index,
            generation,
            report,
        })
    }

    /// Stage `index` with the content written by `fill`, commit it as the
    /// next generation and prune old ones.
    fn publish<F>(&self, layout: &UnitLayout, index: &Index, fill: F) -> Result<u64>
    where
        F: FnOnce(&Staging) -> io::Result<()>,
    {
        index.validate()?;

        let failure = |path: &Path, source: io::Error| IndexError::WriteFailure {
            unit: index.unit_key.clone(),
            path: path.to_path_buf(),
            source,
        };

        let staging = layout.begin().map_err(|e| failure(layout.dir(), e))?;
        fill(&staging).map_err(|e| failure(staging.dir(), e))?;
        staging.write_index(index).map_err(|e| failure(staging.dir(), e))?;

        let latest = layout.generations().map_err(|e| failure(layout.dir(), e))?;
        let current = layout.current_generation().map_err(|e| failure(layout.dir(), e))?;
        let generation = latest.last().copied().max(current).unwrap_or(0) + 1;

        staging
            .commit(layout, generation)
            .map_err(|e| failure(&layout.generation_dir(generation), e))?;

        match layout.prune(self.retained_generations) {
            Ok(0) => {}
            Ok(removed) => debug!("Pruned {} old generations of {}", removed, index.unit_key),
            Err(e) => warn!("Failed to prune generations of {}: {}", index.unit_key, e),
        }

        Ok(generation)
    }

    fn load_current(&self, layout: &UnitLayout) -> Result<Option<(u64, Index)>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(generation) = layout.current_generation()? else {
                return Ok(None);
            };
            match self.read_generation(layout, generation) {
                Ok(index) => return Ok(index.map(|index| (generation, index))),
                Err(IndexError::Io(e)) if e.kind() == io::ErrorKind::NotFound && attempt < LOAD_ATTEMPTS => {
                    debug!("Generation {} of {:?} vanished, retrying", generation, layout.dir());
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn read_generation(&self, layout: &UnitLayout, generation: u64) -> Result<Option<Index>> {
        let data = fs::read(layout.index_path(generation))?;

        let header: IndexHeader = serde_json::from_slice(&data)?;
        if header.schema_version > SCHEMA_VERSION {
            let err = IndexError::SchemaVersionTooNew {
                found: header.schema_version,
                supported: SCHEMA_VERSION,
            };
            warn!("Ignoring index at {:?}: {}", layout.dir(), err);
            return Ok(None);
        }

        let mut index: Index = serde_json::from_slice(&data)?;
        if index.schema_version < SCHEMA_VERSION {
            debug!(
                "Upgrading {} from schema v{} in memory",
                index.unit_key, index.schema_version
            );
            index.backfill(&layout.content_dir(generation), &self.registry);
        }
        Ok(Some(index))
    }

    fn indexer(&self) -> ParallelIndexer {
        ParallelIndexer::new(Arc::clone(&self.registry), self.threads).with_progress(self.show_progress)
    }

    fn summarize(&self, files: &mut [FileExtraction]) {
        for file in files {
            summarize_missing(self.summarizer.as_ref(), &mut file.symbols);
        }
    }

    /// Cross-process exclusion for writers of `unit`.
    fn write_lock(&self, layout: &UnitLayout, unit: &str) -> Result<WriteLock> {
        layout
            .lock(WRITE_LOCK_TIMEOUT)
            .map_err(|source| IndexError::WriteFailure {
                unit: unit.to_string(),
                path: layout.dir().to_path_buf(),
                source,
            })
    }

    fn unit_lock(&self, unit: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(unit.to_string()).or_default())
    }
}

fn content_map(files: &[SourceFile]) -> HashMap<&str, &[u8]> {
    files
        .iter()
        .map(|f| (f.path.as_str(), f.content.as_slice()))
        .collect()
}

fn read_range(path: &Path, offset: u64, length: usize) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0; length];
    file.read_exact(&mut buf)?;
    Ok(buf)
}
