/// Confirm a destructive action, bypassing the prompt with `--yes`
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

/// Ask for a secret that was not supplied through config or environment
pub fn prompt_secret(message: &str, non_interactive: bool) -> anyhow::Result<String> {
    if non_interactive {
        anyhow::bail!(
            "No password configured. Set {} or `password` in the config file.",
            crate::config::PASSWORD_ENV
        );
    }

    let secret = inquire::Password::new(message)
        .without_confirmation()
        .with_validator(|input: &str| {
            if input.is_empty() {
                Err("Password cannot be empty".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(secret)
}
