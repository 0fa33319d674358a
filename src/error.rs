//! Typed errors for the indexing engine.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("a profile is already registered for language '{0}'")]
    DuplicateProfile(String),

    #[error("{kind} node at line {line} has no name")]
    UnnamedSymbol { kind: String, line: usize },

    #[error("malformed symbol hierarchy in {file}: {reason}")]
    MalformedHierarchy { file: String, reason: String },

    #[error("stored index schema v{found} is newer than supported v{supported}")]
    SchemaVersionTooNew { found: u32, supported: u32 },

    #[error("index for unit '{unit}' is inconsistent: {reason}")]
    InconsistentIndex { unit: String, reason: String },

    #[error("backing content for '{path}' in unit '{unit}' is missing; re-index the unit")]
    ContentMissing { unit: String, path: String },

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("unit not indexed: {0}")]
    UnitNotFound(String),

    #[error("invalid unit key '{0}'")]
    InvalidUnitKey(String),

    #[error("failed to commit index for unit '{unit}' at {path:?}: {source}")]
    WriteFailure {
        unit: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to parse {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
