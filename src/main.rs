use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use symdex::cli::{Cli, Commands};
use symdex::commands;
use symdex::config::Config;
use symdex::logging::{init_early_logging, init_logging};

fn main() -> Result<()> {
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let config = match Config::load(&project_root) {
        Ok(config) => config,
        Err(e) => {
            init_early_logging();
            return Err(e);
        }
    };

    // Held until exit so buffered log lines are flushed
    let _logging_guard = init_logging(&config.logging, &project_root)?;
    tracing::debug!("Loaded configuration from: {}", project_root.display());

    let cli = Cli::parse();
    let store = commands::open_store(&config, cli.storage)?;

    match cli.command {
        Commands::Index {
            path,
            unit,
            full,
            revision,
        } => {
            let store = store.with_progress(true);
            commands::index::run(&store, &config, &path, unit, full, revision)?;
        }
        Commands::Search {
            unit,
            query,
            kind,
            path,
            limit,
        } => {
            commands::query::search_symbols(
                &store,
                &config,
                &unit,
                &query,
                kind.as_deref(),
                path.as_deref(),
                limit,
            )?;
        }
        Commands::Outline { unit, file } => commands::query::outline(&store, &unit, &file)?,
        Commands::Tree { unit, prefix } => commands::query::tree(&store, &unit, &prefix)?,
        Commands::Show { unit, ids } => commands::query::show(&store, &unit, &ids)?,
        Commands::List => commands::units::list(&store)?,
        Commands::Delete { unit } => commands::units::delete(&store, &unit)?,
    }

    Ok(())
}
