//! Symbol extraction, indexing and incremental caching for token-minimal code
//! lookup.
//!
//! Source files are parsed with tree-sitter, declarations are extracted as
//! flat [`symbol::Symbol`] records driven by per-language
//! [`language::LanguageProfile`]s, and the result is committed to an
//! [`storage::IndexStore`] as an immutable generation. Symbol source is read
//! back by byte range without re-parsing.

pub mod cli;
pub mod commands;
pub mod config;
pub mod cst;
pub mod error;
pub mod indexing;
pub mod language;
pub mod logging;
pub mod query;
pub mod storage;
pub mod summarizer;
pub mod symbol;
pub mod walker;

pub use config::Config;
pub use error::{IndexError, Result};
pub use storage::IndexStore;
