//! Language profile registry.
//!
//! Language-specific behaviour is data: each language contributes a
//! [`LanguageProfile`] consumed by the one generic extractor. The registry is
//! built once and handed around explicitly (usually as `Arc<ProfileRegistry>`).

pub mod go;
pub mod java;
pub mod javascript;
pub mod profile;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;

pub use profile::{ConstantRule, DocStrategy, LanguageProfile, LanguageProfileBuilder, NameRule};

use crate::error::{IndexError, Result};

/// Language tag to profile mapping.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, LanguageProfile>,
}

impl ProfileRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every bundled profile.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtins = [
            ("python", python::profile()),
            ("javascript", javascript::profile()),
            ("typescript", typescript::profile(&["ts", "mts", "cts"])),
            ("tsx", typescript::profile(&["tsx"])),
            ("go", go::profile()),
            ("rust", rust::profile()),
            ("java", java::profile()),
        ];
        for (tag, profile) in builtins {
            registry.profiles.insert(tag.to_string(), profile);
        }
        registry
    }

    /// Register a profile under `tag`. Tags are never silently replaced.
    pub fn register(&mut self, tag: &str, profile: LanguageProfile) -> Result<()> {
        if self.profiles.contains_key(tag) {
            return Err(IndexError::DuplicateProfile(tag.to_string()));
        }
        self.profiles.insert(tag.to_string(), profile);
        Ok(())
    }

    pub fn resolve(&self, tag: &str) -> Result<&LanguageProfile> {
        self.profiles
            .get(tag)
            .ok_or_else(|| IndexError::UnsupportedLanguage(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.profiles.contains_key(tag)
    }

    /// Language tag for a path, by its extension.
    pub fn detect_language(&self, path: impl AsRef<Path>) -> Option<&str> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        let mut matches: Vec<&str> = self
            .profiles
            .iter()
            .filter(|(_, profile)| profile.extensions().contains(&ext.as_str()))
            .map(|(tag, _)| tag.as_str())
            .collect();
        // Deterministic when two profiles claim the same extension.
        matches.sort_unstable();
        matches.first().copied()
    }

    /// Registered tags, sorted.
    pub fn supported_languages(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.profiles.keys().map(|s| s.as_str()).collect();
        tags.sort_unstable();
        tags
    }

    /// Every extension claimed by a registered profile, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self
            .profiles
            .values()
            .flat_map(|p| p.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }
}
