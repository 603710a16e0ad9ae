use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::store::name::{validate_database_name, validate_principal_name};
use crate::types::{NewPrincipal, Role, RoleGrant};

/// The application principal to ensure, scoped to one database.
#[derive(Clone)]
pub struct PrincipalSpec {
    pub name: String,
    pub secret: String,
    pub database: String,
    pub grant_db_admin: bool,
}

impl PrincipalSpec {
    /// `readWrite` on the target database, plus `dbAdmin` when requested.
    #[must_use]
    pub fn roles(&self) -> Vec<RoleGrant> {
        let mut roles = vec![RoleGrant::new(Role::ReadWrite, &self.database)];
        if self.grant_db_admin {
            roles.push(RoleGrant::new(Role::DbAdmin, &self.database));
        }
        roles
    }

    fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("principal name cannot be empty".to_string()));
        }
        if self.secret.is_empty() {
            return Err(Error::Config("principal secret cannot be empty".to_string()));
        }
        validate_principal_name(&self.name)?;
        validate_database_name(&self.database)
    }
}

impl std::fmt::Debug for PrincipalSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalSpec")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("database", &self.database)
            .field("grant_db_admin", &self.grant_db_admin)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

fn creation_error(spec: &PrincipalSpec, source: &Error) -> Error {
    Error::PrincipalCreation {
        name: spec.name.clone(),
        reason: source.to_string(),
    }
}

/// Ensures the application principal exists. An existing principal is left
/// untouched, including its secret and grants.
pub fn provision_principal(store: &impl Store, spec: &PrincipalSpec) -> Result<ProvisionOutcome> {
    spec.check().map_err(|e| creation_error(spec, &e))?;

    if store
        .get_principal(&spec.name)
        .map_err(|e| creation_error(spec, &e))?
        .is_some()
    {
        info!(principal = %spec.name, "principal already exists, skipping creation");
        return Ok(ProvisionOutcome::AlreadyExists);
    }

    let request = NewPrincipal {
        name: spec.name.clone(),
        secret: spec.secret.clone(),
        roles: spec.roles(),
    };

    match store.create_principal(&request) {
        Ok(principal) => {
            let grants: Vec<String> = principal.roles.iter().map(ToString::to_string).collect();
            info!(principal = %principal.name, grants = ?grants, "principal created");
            Ok(ProvisionOutcome::Created)
        }
        Err(Error::AlreadyExists) => {
            warn!(principal = %spec.name, "principal was created concurrently");
            Ok(ProvisionOutcome::AlreadyExists)
        }
        Err(e) => Err(creation_error(spec, &e)),
    }
}
