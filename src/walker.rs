//! Lists the source files of a unit.

use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::IndexerConfig;
use crate::error::Result;
use crate::indexing::SourceFile;
use crate::language::ProfileRegistry;

/// Bytes inspected when deciding whether a file is binary.
const BINARY_SNIFF_LEN: usize = 8192;

/// Walks the filesystem respecting .gitignore and the configured filters
pub struct Walker {
    root: PathBuf,
    extensions: HashSet<String>,
    skip_patterns: Vec<String>,
    max_file_size: u64,
    max_files: usize,
    priority_dirs: Vec<String>,
}

impl Walker {
    /// Create a new Walker with the given root directory and configuration
    pub fn new(root: PathBuf, config: &IndexerConfig) -> Self {
        Self {
            root,
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
            skip_patterns: config.skip_patterns.clone(),
            max_file_size: config.max_file_size,
            max_files: config.max_files,
            priority_dirs: config.priority_dirs.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative, forward-slash paths of every file to index.
    ///
    /// Sorted by path. When more than `max_files` qualify, files under the
    /// priority directories and shallower files are kept first.
    pub fn collect_files(&self) -> Vec<String> {
        let root = self.root.clone();
        let skip_patterns = self.skip_patterns.clone();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .hidden(true)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                match relative_path(&root, entry.path()) {
                    Some(rel) if is_dir => !is_skipped(&format!("{rel}/"), &skip_patterns),
                    _ => true,
                }
            });

        let mut files: Vec<String> = builder
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|entry| self.has_wanted_extension(entry))
            .filter(|entry| self.within_size_limit(entry))
            .filter_map(|entry| relative_path(&self.root, entry.path()))
            .filter(|rel| !is_skipped(rel, &self.skip_patterns))
            .collect();

        if files.len() > self.max_files {
            info!(
                "{} files found, keeping the first {} by priority",
                files.len(),
                self.max_files
            );
            files.sort_by_cached_key(|path| self.priority_key(path));
            files.truncate(self.max_files);
        }
        files.sort();
        files
    }

    /// Read every listed file into a [`SourceFile`] with its language tag.
    ///
    /// Files without a matching profile, binary files and unreadable files
    /// are left out.
    pub fn load_sources(&self, registry: &ProfileRegistry) -> Result<Vec<SourceFile>> {
        let mut sources = Vec::new();
        for rel in self.collect_files() {
            let Some(language) = registry.detect_language(&rel) else {
                debug!("No language profile for {}", rel);
                continue;
            };
            let content = match std::fs::read(self.root.join(&rel)) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read {}: {}", rel, e);
                    continue;
                }
            };
            if is_binary(&content) {
                debug!("Skipping binary file {}", rel);
                continue;
            }
            sources.push(SourceFile::new(rel, content, language));
        }
        Ok(sources)
    }

    fn has_wanted_extension(&self, entry: &DirEntry) -> bool {
        entry
            .path()
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    fn within_size_limit(&self, entry: &DirEntry) -> bool {
        match entry.metadata() {
            Ok(meta) if meta.len() > self.max_file_size => {
                debug!("Skipping {:?}: {} bytes", entry.path(), meta.len());
                false
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }

    /// (priority directory index, depth, path)
    fn priority_key(&self, path: &str) -> (usize, usize, String) {
        let priority = self
            .priority_dirs
            .iter()
            .position(|dir| path.starts_with(dir.as_str()) || path.contains(&format!("/{dir}")))
            .unwrap_or(self.priority_dirs.len());
        (priority, path.matches('/').count(), path.to_string())
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn is_skipped(rel: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| rel.contains(pattern.as_str()))
}

fn is_binary(content: &[u8]) -> bool {
    content[..content.len().min(BINARY_SNIFF_LEN)].contains(&0)
}
