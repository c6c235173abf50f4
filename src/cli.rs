use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dbstate: save, restore and reset SQLite fixture databases
#[derive(Parser, Debug)]
#[command(name = "dbstate", version, about = "Save, restore and reset SQLite database files for test fixtures.", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Connection string of the active database (e.g., sqlite:/var/data/app/test.db)
    #[arg(short = 'c', long = "connection", global = true)]
    pub connection: Option<String>,

    /// Config file to read instead of ./.dbstate.json
    #[arg(long = "config", value_name = "file", global = true)]
    pub config: Option<PathBuf>,

    /// Use the connection path as written instead of lower-casing it
    #[arg(long = "preserve-case", global = true)]
    pub preserve_case: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy the active database to a new snapshot and print its key
    Save,

    /// Restore the database from a snapshot
    Load {
        /// Key printed by `save`
        key: String,
    },

    /// Delete the active database so the next open starts empty
    Reset {
        /// Migration to apply afterwards (not supported yet)
        #[arg(long, value_name = "target")]
        migrate: Option<String>,
    },

    /// Delete one snapshot
    Delete {
        /// Key of the snapshot to delete
        key: String,
    },

    /// Delete every snapshot in the storage directory
    Purge {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List snapshots in the storage directory
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the storage path and active filename
    Info,

    /// Check whether the active database matches a snapshot
    Verify {
        /// Key of the snapshot to compare against
        key: String,
    },

    /// Print CLI version
    Version,
}
