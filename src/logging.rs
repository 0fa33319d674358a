//! Logging setup for the symdex binary.
//!
//! An `EnvFilter`-driven stderr layer plus an optional rolling log file.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_DIRECTIVE: &str = "symdex=info";

/// Flushes pending log lines when dropped; hold it until the process exits.
#[must_use = "dropping the guard stops the log writers"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
///
/// Relative log directories are resolved against `project_root`.
pub fn init_logging(config: &LoggingConfig, project_root: &Path) -> Result<LoggingGuard> {
    let mut guards = Vec::new();

    let file_layer = if config.enabled {
        let log_dir = resolve_log_dir(&config.directory, project_root);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let appender =
            RollingFileAppender::new(parse_rotation(&config.rotation), &log_dir, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_filter(parse_level(&config.level)),
        )
    } else {
        None
    };

    let stderr_layer = if config.stderr {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        guards.push(guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_filter(env_filter()),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging subscriber")?;

    Ok(LoggingGuard { _guards: guards })
}

/// Stderr-only logging for failures before the config is read.
pub fn init_early_logging() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn resolve_log_dir(directory: &Path, project_root: &Path) -> PathBuf {
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        project_root.join(directory)
    }
}

fn parse_level(level: &str) -> EnvFilter {
    let level = level.to_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => EnvFilter::new(format!("symdex={level}")),
        _ => {
            eprintln!("Warning: Unknown log level '{}', defaulting to 'info'", level);
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }
    }
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation.to_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        other => {
            eprintln!("Warning: Unknown rotation '{}', defaulting to 'daily'", other);
            Rotation::DAILY
        }
    }
}
