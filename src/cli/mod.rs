mod commands;
mod info;
mod prompt;
mod setup;
mod verify;

pub use commands::{Commands, StoreArgs};
pub use info::run_info;
pub use prompt::{confirm_action, prompt_secret};
pub use setup::{run_catalog, run_seed, run_setup_command};
pub use verify::run_verify;

use crate::config::SetupConfig;
use crate::store::{SqliteDatabase, SqliteStore, Store};

/// Load configuration: file, then environment, then command-line flags
pub fn load_config(args: &StoreArgs) -> anyhow::Result<SetupConfig> {
    let mut config = SetupConfig::load(args.config.as_deref())?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Open the store for the configured data directory
pub fn open_store(config: &SetupConfig) -> anyhow::Result<SqliteStore> {
    SqliteStore::with_admin_database(&config.data_dir, &config.admin_database).map_err(Into::into)
}

/// Open the target database, checking setup has already created it
pub fn init_database(config: &SetupConfig) -> anyhow::Result<(SqliteStore, SqliteDatabase)> {
    let store = open_store(config)?;

    if !store.database_exists(&config.database) {
        anyhow::bail!(
            "Database '{}' not found in {}. Run 'personadb setup' first.",
            config.database,
            config.data_dir.display()
        );
    }

    let db = store.database(&config.database)?;
    Ok((store, db))
}
