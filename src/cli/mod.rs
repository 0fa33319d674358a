use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "symdex")]
#[command(author, version, about = "Symbol index for token-minimal code lookup")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store root, overriding the configured one
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a folder, incrementally unless --full is given
    Index {
        /// Folder to index
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Unit key (default: local/<folder name>)
        #[arg(short, long)]
        unit: Option<String>,

        /// Rebuild from scratch instead of merging changes
        #[arg(long)]
        full: bool,

        /// Source revision to record, e.g. a commit hash
        #[arg(long)]
        revision: Option<String>,
    },

    /// Search symbols of a unit
    Search {
        unit: String,

        /// Search query
        query: String,

        /// Only symbols of this kind: function, class, method, constant or type
        #[arg(short, long)]
        kind: Option<String>,

        /// Only files matching this glob
        #[arg(short, long)]
        path: Option<String>,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the symbol outline of one file
    Outline {
        unit: String,

        /// File path relative to the unit root
        file: String,
    },

    /// Show the indexed file tree
    Tree {
        unit: String,

        /// Only files under this path
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Show symbols with their source
    Show {
        unit: String,

        /// Symbol IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List indexed units
    List,

    /// Delete a unit's index
    Delete { unit: String },
}
