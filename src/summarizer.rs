//! One-line symbol summaries.
//!
//! Summaries are produced after extraction and before commit, so that search
//! can score against them. Richer (e.g. model-backed) summarizers plug in
//! through [`Summarizer`]; the heuristic one needs nothing but the symbol.

use crate::symbol::{Symbol, SymbolKind};

/// Maximum characters in a heuristic summary.
pub const MAX_SUMMARY_CHARS: usize = 120;

pub trait Summarizer: Send + Sync {
    /// A single-line description of `symbol`.
    fn summarize(&self, symbol: &Symbol) -> String;
}

/// Documentation's first sentence, else a description built from the
/// signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSummarizer;

impl Summarizer for HeuristicSummarizer {
    fn summarize(&self, symbol: &Symbol) -> String {
        if let Some(sentence) = first_sentence(&symbol.documentation) {
            return sentence;
        }

        match symbol.kind {
            SymbolKind::Class => format!("Class {}", symbol.name),
            SymbolKind::Constant => format!("Constant {}", symbol.name),
            SymbolKind::Type => format!("Type definition {}", symbol.name),
            SymbolKind::Function | SymbolKind::Method if !symbol.signature.is_empty() => {
                truncate(symbol.signature.lines().next().unwrap_or_default())
            }
            SymbolKind::Function | SymbolKind::Method => String::new(),
        }
    }
}

/// Fill in every empty summary.
pub fn summarize_missing(summarizer: &dyn Summarizer, symbols: &mut [Symbol]) {
    for symbol in symbols.iter_mut().filter(|s| s.summary.is_empty()) {
        symbol.summary = summarizer.summarize(symbol);
    }
}

/// First line of `doc`, cut after its first period.
fn first_sentence(doc: &str) -> Option<String> {
    let line = doc.lines().map(str::trim).find(|l| !l.is_empty())?;
    let sentence = match line.find(". ") {
        Some(end) => &line[..=end],
        None => line,
    };
    Some(truncate(sentence))
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_SUMMARY_CHARS {
        text.to_string()
    } else {
        text.chars().take(MAX_SUMMARY_CHARS).collect()
    }
}
