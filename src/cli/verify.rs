use crate::store::Store;
use crate::types::effective_privileges;

use super::{StoreArgs, load_config, open_store, prompt_secret};

pub fn run_verify(args: StoreArgs, non_interactive: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = open_store(&config)?;
    store.initialize()?;

    let secret = match config.configured_password() {
        Some(password) => password.to_string(),
        None => prompt_secret(
            &format!("Password for '{}':", config.app_user),
            non_interactive,
        )?,
    };

    let Some(principal) = store.authenticate(&config.app_user, &secret)? else {
        anyhow::bail!(
            "Authentication failed for '{}'. Check the password or run 'personadb setup'.",
            config.app_user
        );
    };

    let privileges = effective_privileges(&principal.roles, &config.database);
    if privileges.bits() == 0 {
        anyhow::bail!(
            "'{}' authenticated but holds no privileges on '{}'",
            principal.name,
            config.database
        );
    }

    println!(
        "Authenticated as '{}' on '{}': {}",
        principal.name, config.database, privileges
    );
    Ok(())
}
