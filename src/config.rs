use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".symdex";
const CONFIG_FILE: &str = "config.toml";

const APP_QUALIFIER: &str = "dev";
const APP_ORGANIZATION: &str = "symdex";
const APP_NAME: &str = "symdex";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// File extensions to index
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Path substrings to skip (in addition to .gitignore)
    #[serde(default = "default_skip_patterns")]
    pub skip_patterns: Vec<String>,

    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Upper bound on files per unit
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Directories kept first when `max_files` truncates the listing
    #[serde(default = "default_priority_dirs")]
    pub priority_dirs: Vec<String>,

    /// Number of extraction threads (None = auto-detect)
    #[serde(default)]
    pub parallel_threads: Option<usize>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            skip_patterns: default_skip_patterns(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            priority_dirs: default_priority_dirs(),
            parallel_threads: None,
        }
    }
}

fn default_extensions() -> Vec<String> {
    [
        "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "mts", "cts", "tsx", "go", "rs", "java",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_skip_patterns() -> Vec<String> {
    vec![
        "node_modules/".to_string(),
        "vendor/".to_string(),
        "target/".to_string(),
        ".git/".to_string(),
        "dist/".to_string(),
        "build/".to_string(),
        "__pycache__/".to_string(),
        ".venv/".to_string(),
        ".min.js".to_string(),
        ".bundle.js".to_string(),
        "_pb2.py".to_string(),
        ".pb.go".to_string(),
        "migrations/".to_string(),
    ]
}

fn default_max_file_size() -> u64 {
    500 * 1024
}

fn default_max_files() -> usize {
    500
}

fn default_priority_dirs() -> Vec<String> {
    ["src/", "lib/", "pkg/", "cmd/", "internal/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store root (None = platform data directory)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Generations kept on disk per unit, the current one included
    #[serde(default = "default_retained_generations")]
    pub retained_generations: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            retained_generations: default_retained_generations(),
        }
    }
}

impl StorageConfig {
    /// The configured root, else the platform data directory, else `~/.symdex`.
    pub fn resolve_root(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
    }
}

fn default_retained_generations() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results to return
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a rolling log file
    #[serde(default)]
    pub enabled: bool,

    /// Also log to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// Level for the file log: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory, relative to the project root unless absolute
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// hourly, daily, minutely or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: default_true(),
            level: default_log_level(),
            directory: default_log_directory(),
            file_prefix: default_file_prefix(),
            rotation: default_rotation(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("logs")
}

fn default_file_prefix() -> String {
    "symdex.log".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Config {
    /// Load configuration from the .symdex directory
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the .symdex directory
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = root.join(CONFIG_DIR);
        let config_path = config_dir.join(CONFIG_FILE);

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }
}
