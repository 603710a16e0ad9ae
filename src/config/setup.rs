use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::setup::{DATABASE, PrincipalSpec, SetupPlan};
use crate::store::DEFAULT_ADMIN_DATABASE;

pub const PASSWORD_ENV: &str = "PERSONADB_APP_PASSWORD";
pub const DATA_DIR_ENV: &str = "PERSONADB_DATA_DIR";

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    pub data_dir: PathBuf,
    pub admin_database: String,
    pub database: String,
    pub app_user: String,
    /// Secret for the application principal. Never written back anywhere.
    pub password: Option<String>,
    pub grant_db_admin: bool,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            admin_database: DEFAULT_ADMIN_DATABASE.to_string(),
            database: DATABASE.to_string(),
            app_user: DATABASE.to_string(),
            password: None,
            grant_db_admin: false,
        }
    }
}

impl std::fmt::Debug for SetupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupConfig")
            .field("data_dir", &self.data_dir)
            .field("admin_database", &self.admin_database)
            .field("database", &self.database)
            .field("app_user", &self.app_user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("grant_db_admin", &self.grant_db_admin)
            .finish()
    }
}

impl SetupConfig {
    /// Reads a TOML file, or the defaults when `path` is `None`.
    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// File, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overrides fields from environment variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup(PASSWORD_ENV).filter(|p| !p.is_empty()) {
            self.password = Some(password);
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// The configured password, ignoring an empty value.
    #[must_use]
    pub fn configured_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// The principal to provision, using `secret` for its credential.
    #[must_use]
    pub fn principal_spec(&self, secret: String) -> PrincipalSpec {
        PrincipalSpec {
            name: self.app_user.clone(),
            secret,
            database: self.database.clone(),
            grant_db_admin: self.grant_db_admin,
        }
    }

    #[must_use]
    pub fn setup_plan(&self, secret: String, seed: bool) -> SetupPlan {
        SetupPlan {
            principal: self.principal_spec(secret),
            database: self.database.clone(),
            seed,
        }
    }
}
