//! Error collection and reporting for parallel extraction

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::warn;

use crate::error::IndexError;
use crate::symbol::{SkipReason, SkippedNode};

/// Stage where a file was dropped during processing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Parse,
    Extraction,
    Hierarchy,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Parse => write!(f, "Parse"),
            ProcessingStage::Extraction => write!(f, "Extraction"),
            ProcessingStage::Hierarchy => write!(f, "Hierarchy"),
        }
    }
}

/// A file excluded from the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: String,
    pub error: String,
    pub stage: ProcessingStage,
}

#[derive(Debug, Default)]
struct Collected {
    files: Vec<FileError>,
    erroneous_nodes: usize,
    unnamed_nodes: usize,
}

/// Collects file and node skips from concurrent workers
#[derive(Clone, Default)]
pub struct ErrorCollector {
    inner: Arc<Mutex<Collected>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file that could not be indexed
    pub fn record(&self, path: &str, error: &IndexError, stage: ProcessingStage) {
        warn!("Skipping {} ({} stage): {}", path, stage, error);
        self.lock().files.push(FileError {
            path: path.to_string(),
            error: error.to_string(),
            stage,
        });
    }

    /// Count declaration nodes passed over inside an indexed file
    pub fn record_skipped_nodes(&self, skipped: &[SkippedNode]) {
        if skipped.is_empty() {
            return;
        }
        let mut inner = self.lock();
        for node in skipped {
            match node.reason {
                SkipReason::Erroneous => inner.erroneous_nodes += 1,
                SkipReason::UnnamedSymbol => inner.unnamed_nodes += 1,
            }
        }
    }

    /// Get the current number of skipped files
    pub fn error_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Generate an error report
    pub fn report(&self) -> ErrorReport {
        let inner = self.lock();
        ErrorReport::new(&inner.files, inner.erroneous_nodes, inner.unnamed_nodes)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collected> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Aggregate of everything skipped during one build or merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub total_errors: usize,
    pub by_stage: BTreeMap<ProcessingStage, Vec<FileError>>,
    /// Declarations dropped because their subtree held a syntax error
    pub erroneous_nodes: usize,
    /// Declarations dropped because no name could be found
    pub unnamed_nodes: usize,
    pub summary: String,
}

impl ErrorReport {
    /// Create a report from a list of file errors and node skip counts
    pub fn new(errors: &[FileError], erroneous_nodes: usize, unnamed_nodes: usize) -> Self {
        let mut by_stage: BTreeMap<ProcessingStage, Vec<FileError>> = BTreeMap::new();
        let mut sorted = errors.to_vec();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        for error in sorted {
            by_stage.entry(error.stage).or_default().push(error);
        }

        let mut parts: Vec<String> = by_stage
            .iter()
            .map(|(stage, files)| {
                let noun = if files.len() == 1 { "file" } else { "files" };
                format!("{} {} skipped: {}", files.len(), noun, stage_reason(*stage, files))
            })
            .collect();
        if erroneous_nodes > 0 {
            parts.push(format!("{erroneous_nodes} declarations with syntax errors"));
        }
        if unnamed_nodes > 0 {
            parts.push(format!("{unnamed_nodes} unnamed declarations"));
        }

        let summary = if parts.is_empty() {
            "No files or declarations skipped".to_string()
        } else {
            parts.join("; ")
        };

        Self {
            total_errors: errors.len(),
            by_stage,
            erroneous_nodes,
            unnamed_nodes,
            summary,
        }
    }

    /// Log the report, with up to five examples per stage
    pub fn log_summary(&self) {
        if !self.has_errors() {
            return;
        }

        warn!("{}", self.summary);
        for (stage, errors) in &self.by_stage {
            for error in errors.iter().take(5) {
                warn!("  {}: {}: {}", stage, error.path, error.error);
            }
            if errors.len() > 5 {
                warn!("  {}: ... and {} more", stage, errors.len() - 5);
            }
        }
    }

    /// Check if any file was skipped
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Paths of every skipped file, sorted
    pub fn skipped_files(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .by_stage
            .values()
            .flatten()
            .map(|e| e.path.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }
}

fn stage_reason(stage: ProcessingStage, files: &[FileError]) -> &'static str {
    match stage {
        ProcessingStage::Parse if files.iter().all(|f| f.error.starts_with("unsupported language")) => {
            "unsupported language"
        }
        ProcessingStage::Parse => "parse failure",
        ProcessingStage::Extraction => "extraction failure",
        ProcessingStage::Hierarchy => "malformed hierarchy",
    }
}
