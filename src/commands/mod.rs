//! Implementations of the CLI subcommands. Every command prints JSON on stdout.

pub mod index;
pub mod query;
pub mod units;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::language::ProfileRegistry;
use crate::storage::IndexStore;

/// Open the store at `root_override`, else at the configured root.
pub fn open_store(config: &Config, root_override: Option<PathBuf>) -> Result<IndexStore> {
    let root = root_override.unwrap_or_else(|| config.storage.resolve_root());
    let store = IndexStore::open(&root, Arc::new(ProfileRegistry::builtin()), &config.storage)
        .with_context(|| format!("Failed to open index store at {}", root.display()))?;
    Ok(store.with_threads(config.indexer.parallel_threads))
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
