//! Parallel symbol extraction using Rayon

use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cst::ParserPool;
use crate::error::Result;
use crate::language::ProfileRegistry;
use crate::symbol::{hierarchy, SymbolExtractor};

use super::errors::{ErrorCollector, ErrorReport, ProcessingStage};
use super::pipeline::{line_count, FileExtraction, SourceFile};

/// Extracts symbols from many files on a bounded worker pool.
///
/// Every worker owns its own [`ParserPool`]. Results are sorted by path, so
/// the output does not depend on scheduling or thread count.
pub struct ParallelIndexer {
    registry: Arc<ProfileRegistry>,
    threads: usize,
    show_progress: bool,
}

impl ParallelIndexer {
    /// Create an indexer; `threads: None` uses one worker per CPU.
    pub fn new(registry: Arc<ProfileRegistry>, threads: Option<usize>) -> Self {
        let threads = threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get);
        Self {
            registry,
            threads,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while extracting.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Extract every file. Files that cannot be indexed are left out of the
    /// result and described in the report.
    pub fn extract_files(&self, files: &[SourceFile]) -> Result<(Vec<FileExtraction>, ErrorReport)> {
        let start = Instant::now();
        let errors = ErrorCollector::new();

        if files.is_empty() {
            return Ok((Vec::new(), errors.report()));
        }

        info!(
            "Extracting symbols from {} files with {} threads",
            files.len(),
            self.threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;
        let progress = self.create_progress_bar(files.len());
        let extractor = SymbolExtractor::new(&self.registry);

        let mut extracted: Vec<FileExtraction> = pool.install(|| {
            files
                .par_iter()
                .map_init(ParserPool::new, |parsers, file| {
                    let result = extract_one(parsers, &extractor, file, &errors);
                    progress.inc(1);
                    result
                })
                .flatten()
                .collect()
        });

        extracted.sort_by(|a, b| a.path.cmp(&b.path));
        progress.finish_and_clear();

        let report = errors.report();
        info!(
            "Extracted {} symbols from {} files in {:.2}s ({} skipped)",
            extracted.iter().map(|f| f.symbols.len()).sum::<usize>(),
            extracted.len(),
            start.elapsed().as_secs_f64(),
            report.total_errors
        );

        Ok((extracted, report))
    }

    /// Create a progress bar with standard styling
    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] Files: [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Parse, extract and validate a single file.
fn extract_one(
    parsers: &mut ParserPool,
    extractor: &SymbolExtractor<'_>,
    file: &SourceFile,
    errors: &ErrorCollector,
) -> Option<FileExtraction> {
    let tree = match parsers.parse(&file.language, &file.content) {
        Ok(tree) => tree,
        Err(e) => {
            errors.record(&file.path, &e, ProcessingStage::Parse);
            return None;
        }
    };

    let extraction = match extractor.extract(&file.content, &file.path, &file.language, tree.root_node()) {
        Ok(extraction) => extraction,
        Err(e) => {
            errors.record(&file.path, &e, ProcessingStage::Extraction);
            return None;
        }
    };

    if let Err(e) = hierarchy::validate(&extraction.symbols) {
        errors.record(&file.path, &e, ProcessingStage::Hierarchy);
        return None;
    }

    errors.record_skipped_nodes(&extraction.skipped);
    debug!("{}: {} symbols", file.path, extraction.symbols.len());

    Some(FileExtraction {
        path: file.path.clone(),
        language: file.language.clone(),
        hash: file.hash(),
        line_count: line_count(&file.content),
        byte_len: file.content.len(),
        symbols: extraction.symbols,
    })
}
