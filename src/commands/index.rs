//! Index command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::indexing::ErrorReport;
use crate::storage::{ChangeSet, IndexStore};
use crate::walker::Walker;

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub unit: String,
    pub generation: u64,
    pub incremental: bool,
    pub file_count: usize,
    pub symbol_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSet>,
    pub skipped: ErrorReport,
}

/// Default unit key of a folder: `local/<folder name>`.
pub fn default_unit_key(root: &Path) -> String {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "root".to_string());
    format!("local/{name}")
}

/// Walk `path` and index it into `store`.
///
/// Without `full`, only files whose content changed since the last commit are
/// re-extracted.
pub fn run(
    store: &IndexStore,
    config: &Config,
    path: &Path,
    unit: Option<String>,
    full: bool,
    revision: Option<String>,
) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot index {}", path.display()))?;
    let unit = unit.unwrap_or_else(|| default_unit_key(&root));

    let walker = Walker::new(root.clone(), &config.indexer);
    let sources = walker.load_sources(store.registry())?;
    tracing::info!("{} files to consider under {}", sources.len(), root.display());

    let summary = if full {
        let outcome = store.build_full(&unit, &sources, revision.as_deref())?;
        IndexSummary {
            unit,
            generation: outcome.generation,
            incremental: false,
            file_count: outcome.index.source_files.len(),
            symbol_count: outcome.index.symbols.len(),
            changes: None,
            skipped: outcome.report,
        }
    } else {
        let changes = store.detect_changes(&unit, &sources)?;
        let batch = changes.clone().into_batch(sources);
        let outcome = store.merge_incremental(&unit, batch, revision.as_deref())?;
        IndexSummary {
            unit,
            generation: outcome.generation,
            incremental: true,
            file_count: outcome.index.source_files.len(),
            symbol_count: outcome.index.symbols.len(),
            changes: Some(changes),
            skipped: outcome.report,
        }
    };

    super::print_json(&summary)
}
