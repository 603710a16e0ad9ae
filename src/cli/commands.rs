use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Where the store lives and how it is configured.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Data directory holding the database files (overrides config and PERSONADB_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the application principal, reset the schema, build indexes and load seed data.
    /// Every persona collection is dropped and recreated: existing data is destroyed.
    Setup {
        #[command(flatten)]
        store: StoreArgs,

        /// Stop after building indexes
        #[arg(long)]
        skip_seed: bool,

        /// Confirm the destructive reset without prompting
        #[arg(long, short)]
        yes: bool,

        /// Skip interactive prompts (requires --yes)
        #[arg(long)]
        non_interactive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the sample data set into an existing database
    Seed {
        #[command(flatten)]
        store: StoreArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upsert the reference profession catalog
    Catalog {
        #[command(flatten)]
        store: StoreArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show collections, indexes, document counts and the application principal
    Info {
        #[command(flatten)]
        store: StoreArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Authenticate as the application principal and show its privileges
    Verify {
        #[command(flatten)]
        store: StoreArgs,

        /// Skip interactive prompts (requires PERSONADB_APP_PASSWORD or a configured password)
        #[arg(long)]
        non_interactive: bool,
    },
}
