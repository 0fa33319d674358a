//! On-disk generation layout and the atomic commit protocol.
//!
//! ```text
//! <root>/<unit slug>/CURRENT            name of the committed generation
//! <root>/<unit slug>/gen-00000007/index.json
//! <root>/<unit slug>/gen-00000007/content/<relative path>
//! <root>/<unit slug>/.staging-<uuid>/   in-progress write
//! <root>/<unit slug>/LOCK               held by the writing process
//! ```
//!
//! A write is staged in full, renamed to a fresh `gen-*` directory, and only
//! becomes visible when `CURRENT` is replaced by rename. Writers in different
//! processes exclude each other through `LOCK`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::model::Index;
use crate::error::{IndexError, Result};
use crate::symbol::encode_path;

const CURRENT_FILE: &str = "CURRENT";
const LOCK_FILE: &str = "LOCK";
const INDEX_FILE: &str = "index.json";
const CONTENT_DIR: &str = "content";
const GENERATION_PREFIX: &str = "gen-";
const STAGING_PREFIX: &str = ".staging-";

/// A lock untouched for this long belongs to a writer that died.
const STALE_LOCK_AGE: Duration = Duration::from_secs(600);
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Directory of one unit under the store root.
#[derive(Debug, Clone)]
pub struct UnitLayout {
    dir: PathBuf,
}

impl UnitLayout {
    /// Layout of `unit_key` under `root`.
    ///
    /// The key's slug must be a single plain path component, so that no key
    /// resolves to the root itself or outside it.
    pub fn new(root: &Path, unit_key: &str) -> Result<Self> {
        let slug = encode_path(unit_key);
        let mut components = Path::new(&slug).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(Self { dir: root.join(slug) }),
            _ => Err(IndexError::InvalidUnitKey(unit_key.to_string())),
        }
    }

    /// Layout for an existing unit directory.
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Committed generation, or `None` if nothing was ever committed.
    pub fn current_generation(&self) -> io::Result<Option<u64>> {
        match fs::read_to_string(self.dir.join(CURRENT_FILE)) {
            Ok(text) => parse_generation(text.trim()).map(Some).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unreadable generation pointer '{}'", text.trim()),
                )
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn generation_dir(&self, generation: u64) -> PathBuf {
        self.dir.join(generation_name(generation))
    }

    pub fn index_path(&self, generation: u64) -> PathBuf {
        self.generation_dir(generation).join(INDEX_FILE)
    }

    pub fn content_dir(&self, generation: u64) -> PathBuf {
        self.generation_dir(generation).join(CONTENT_DIR)
    }

    /// Backing file of `relative` in `generation`.
    pub fn content_path(&self, generation: u64, relative: &str) -> PathBuf {
        self.content_dir(generation).join(relative)
    }

    /// Generations present on disk, ascending.
    pub fn generations(&self) -> io::Result<Vec<u64>> {
        let mut generations = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(generations),
            Err(e) => return Err(e),
        };
        for entry in entries {
            let entry = entry?;
            if let Some(generation) = entry.file_name().to_str().and_then(parse_generation) {
                generations.push(generation);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }

    /// Start a staged write.
    pub fn begin(&self) -> io::Result<Staging> {
        let dir = self
            .dir
            .join(format!("{STAGING_PREFIX}{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join(CONTENT_DIR))?;
        Ok(Staging {
            dir,
            committed: false,
        })
    }

    /// Take the unit's write lock, waiting up to `timeout` for another writer.
    ///
    /// The unit directory is created if needed. A lock file left untouched
    /// for ten minutes is removed and taken over.
    pub fn lock(&self, timeout: Duration) -> io::Result<WriteLock> {
        let path = self.dir.join(LOCK_FILE);
        let deadline = Instant::now() + timeout;

        loop {
            fs::create_dir_all(&self.dir)?;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let lock = WriteLock { path };
                    writeln!(file, "{}", std::process::id())?;
                    return Ok(lock);
                }
                // The unit was deleted between creating the directory and the lock.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        warn!("Taking over stale lock {:?}", path);
                        match fs::remove_file(&path) {
                            Ok(()) => continue,
                            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                            Err(e) => return Err(e),
                        }
                    }
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("another writer holds {}", path.display()),
                        ));
                    }
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Remove generations older than the newest `retained`, never the current one.
    pub fn prune(&self, retained: usize) -> io::Result<usize> {
        let current = self.current_generation()?;
        let generations = self.generations()?;
        let keep_from = generations.len().saturating_sub(retained.max(1));

        let mut removed = 0;
        for &generation in &generations[..keep_from] {
            if Some(generation) == current {
                continue;
            }
            match fs::remove_dir_all(self.generation_dir(generation)) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to prune {}: {}", generation_name(generation), e),
            }
        }
        Ok(removed)
    }
}

/// Exclusive write access to one unit. Released on drop.
#[derive(Debug)]
pub struct WriteLock {
    path: PathBuf,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            // Deleting the unit removes the lock with it.
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to release lock {:?}: {}", self.path, e);
            }
        }
    }
}

fn is_stale(lock: &Path) -> bool {
    fs::metadata(lock)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > STALE_LOCK_AGE)
}

/// An in-progress write. Dropped without [`Staging::commit`], it removes itself.
#[derive(Debug)]
pub struct Staging {
    dir: PathBuf,
    committed: bool,
}

impl Staging {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write backing content for `relative`.
    pub fn write_content(&self, relative: &str, bytes: &[u8]) -> io::Result<()> {
        let target = self.content_target(relative)?;
        fs::write(target, bytes)
    }

    /// Reuse backing content from a committed generation: hard link, or copy
    /// where linking is not possible.
    pub fn link_content(&self, relative: &str, existing: &Path) -> io::Result<()> {
        let target = self.content_target(relative)?;
        if let Err(e) = fs::hard_link(existing, &target) {
            debug!("Hard link of {} failed ({}), copying", relative, e);
            fs::copy(existing, &target)?;
        }
        Ok(())
    }

    /// Write `index.json` and flush it to disk.
    pub fn write_index(&self, index: &Index) -> io::Result<()> {
        let data = serde_json::to_vec(index).map_err(io::Error::from)?;
        let mut file = File::create(self.dir.join(INDEX_FILE))?;
        file.write_all(&data)?;
        file.sync_all()
    }

    /// Publish as `generation` and swap `CURRENT` to it.
    pub fn commit(mut self, layout: &UnitLayout, generation: u64) -> io::Result<()> {
        let target = layout.generation_dir(generation);
        fs::rename(&self.dir, &target)?;
        self.committed = true;

        let tmp = layout
            .dir
            .join(format!("{CURRENT_FILE}.{}.tmp", uuid::Uuid::new_v4()));
        let swap = || -> io::Result<()> {
            {
                let mut file = File::create(&tmp)?;
                file.write_all(generation_name(generation).as_bytes())?;
                file.sync_all()?;
            }
            fs::rename(&tmp, layout.dir.join(CURRENT_FILE))
        };

        if let Err(e) = swap() {
            let _ = fs::remove_file(&tmp);
            // Only a generation that never became visible may be dropped.
            if !matches!(layout.current_generation(), Ok(Some(current)) if current == generation) {
                let _ = fs::remove_dir_all(&target);
            }
            return Err(e);
        }
        Ok(())
    }

    fn content_target(&self, relative: &str) -> io::Result<PathBuf> {
        let relative = safe_relative(relative)?;
        let target = self.dir.join(CONTENT_DIR).join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(target)
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_dir_all(&self.dir) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove staging directory {:?}: {}", self.dir, e);
                }
            }
        }
    }
}

fn generation_name(generation: u64) -> String {
    format!("{GENERATION_PREFIX}{generation:08}")
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

/// Reject absolute paths and `..` so content stays inside the generation.
fn safe_relative(relative: &str) -> io::Result<&Path> {
    let path = Path::new(relative);
    let plain = !relative.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to store content outside the unit: '{relative}'"),
        ))
    }
}
