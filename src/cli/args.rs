//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::application::services::DuplicatePolicy;
use crate::domain::ProductId;

/// Inventory of products kept in a height-balanced search tree
#[derive(Parser, Debug)]
#[command(name = "stockavl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Snapshot file (overrides config)
    #[arg(short = 'f', long, global = true, value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    /// Directory holding a local .stockavl.toml
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Duplicate ids in snapshot data (overrides config)
    #[arg(long, global = true, value_enum)]
    pub on_duplicate: Option<DuplicatePolicy>,

    /// Print author and version
    #[arg(long)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all products ordered by id
    List,

    /// Show one product
    Find {
        /// Product id
        id: ProductId,
    },

    /// Add a new product
    Add {
        /// Product id (must be unused)
        id: ProductId,
        /// Product name
        name: String,
        /// Unit price, e.g. 12.50 or 12,50
        price: String,
        /// Units in stock
        #[arg(default_value_t = 0)]
        quantity: u32,
    },

    /// Remove a product
    Remove {
        /// Product id
        id: ProductId,
    },

    /// Show the shape of the balanced tree
    Tree,

    /// Show inventory totals and tree height
    Stats,

    /// Verify the tree invariants
    Check,

    /// Merge products from another snapshot file
    Import {
        /// Snapshot file to read
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Write the ordered snapshot to a file
    Export {
        /// Target file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config instead of a local one in -C <dir> (or cwd)
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

impl Commands {
    /// Commands that may change the inventory and trigger an autosave.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Add { .. } | Commands::Remove { .. } | Commands::Import { .. }
        )
    }
}
