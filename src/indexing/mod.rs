//! Parallel extraction pipeline

pub mod errors;
pub mod parallel;
pub mod pipeline;

pub use errors::{ErrorCollector, ErrorReport, FileError, ProcessingStage};
pub use parallel::ParallelIndexer;
pub use pipeline::{content_hash, line_count, FileExtraction, SourceFile};
