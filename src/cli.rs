use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;

/// FormVault CLI - Save and restore form data across page loads
#[derive(Parser)]
#[command(name = "formvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Vault directory (overrides the platform data directory)
    #[arg(long, env = "FORMVAULT_STORAGE_DATADIR", global = true)]
    pub data_dir: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a page snapshot for forms and fields
    Scan {
        /// Path to a page snapshot JSON file
        snapshot: String,
    },

    /// Fill a page snapshot from a saved profile
    Fill {
        /// Path to a page snapshot JSON file
        snapshot: String,

        /// Profile id to fill from (default: most recent for the page)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Capture current field values and save them as a profile
    Save {
        /// Path to a page snapshot JSON file
        snapshot: String,

        /// Profile name (default: the page's domain)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print the current values of a page snapshot's fields
    Values {
        /// Path to a page snapshot JSON file
        snapshot: String,
    },

    /// Saved profile management
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Export all profiles and settings to a file
    Export {
        /// Output file path
        path: String,
    },

    /// Import profiles and settings from an export file
    Import {
        /// Input file path
        path: String,
    },

    /// Settings management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List all saved profiles
    List,

    /// Show profile details
    Show {
        /// Profile id
        id: String,
    },

    /// Delete a profile
    Delete {
        /// Profile id
        id: String,
    },

    /// Delete all profiles
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,

    /// Set a settings value (JSON, e.g. `autoFill true`)
    Set {
        /// Settings key (camelCase)
        key: String,
        /// New value
        value: String,
    },

    /// Get a settings value
    Get {
        /// Settings key (camelCase)
        key: String,
    },

    /// Show configuration and vault file paths
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Scan { snapshot } => commands::page::scan(self, snapshot).await,
            Commands::Fill { snapshot, profile } => {
                commands::page::fill(self, snapshot, profile.as_deref()).await
            }
            Commands::Save { snapshot, name } => {
                commands::page::save(self, snapshot, name.as_deref()).await
            }
            Commands::Values { snapshot } => commands::page::values(self, snapshot).await,
            Commands::Profile { command } => commands::profile::run(self, command).await,
            Commands::Export { path } => commands::transfer::export(self, path).await,
            Commands::Import { path } => commands::transfer::import(self, path).await,
            Commands::Config { command } => commands::config::run(self, command).await,
        }
    }
}
