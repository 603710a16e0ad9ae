//! The persona bootstrap procedure.
//!
//! Stages run strictly in order against handles passed in by the caller:
//!
//! 1. [`provision_principal`] ensures the application principal exists.
//!    Failure is logged and reported, never fatal.
//! 2. [`reset_collections`] drops and recreates the four collections with
//!    their validators. This destroys existing data.
//! 3. [`build_indexes`] creates the relational indexes.
//! 4. [`load_seed`] inserts the sample set, reporting rejected documents.
//!
//! Stages 2 and 3 are fatal on error: [`run_setup`] returns the error with the
//! collection (and index) that caused it.

mod catalog;
mod collections;
mod indexes;
mod provision;
mod schema;
mod seed;

pub use catalog::{CatalogReport, profession_catalog, upsert_professions};
pub use collections::{
    CollectionSpec, DATABASE, ESTUDIOS, PERSONA, PROFESION, Reference, TELEFONO,
    collection_specs, find_spec,
};
pub use indexes::{IndexReport, build_indexes};
pub use provision::{PrincipalSpec, ProvisionOutcome, provision_principal};
pub use schema::{CollectionReset, reset_collections};
pub use seed::{
    CollectionSeedReport, FailureKind, SeedFailure, SeedReport, load_seed, sample_records,
};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::Store;

/// What a bootstrap run should do.
#[derive(Debug, Clone)]
pub struct SetupPlan {
    pub principal: PrincipalSpec,
    /// Target database; every later stage runs against this handle.
    pub database: String,
    pub seed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrincipalStatus {
    Created,
    AlreadyExists,
    Failed { reason: String },
}

impl From<ProvisionOutcome> for PrincipalStatus {
    fn from(outcome: ProvisionOutcome) -> Self {
        match outcome {
            ProvisionOutcome::Created => PrincipalStatus::Created,
            ProvisionOutcome::AlreadyExists => PrincipalStatus::AlreadyExists,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalReport {
    pub name: String,
    #[serde(flatten)]
    pub status: PrincipalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub principal: PrincipalReport,
    pub database: String,
    pub collections: Vec<CollectionReset>,
    pub indexes: Vec<IndexReport>,
    pub seed: Option<SeedReport>,
}

impl SetupReport {
    #[must_use]
    pub fn principal_created(&self) -> bool {
        self.principal.status == PrincipalStatus::Created
    }
}

/// Runs the whole bootstrap. Returns `Err` only for fatal stage failures.
/// `DatabaseUnavailable` and `SchemaDefinition` come from the schema stage,
/// `IndexBuild` from indexing.
pub fn run_setup<S: Store>(store: &S, plan: &SetupPlan) -> Result<SetupReport> {
    let status = match store
        .initialize()
        .map_err(|e| Error::PrincipalCreation {
            name: plan.principal.name.clone(),
            reason: e.to_string(),
        })
        .and_then(|()| provision_principal(store, &plan.principal))
    {
        Ok(outcome) => outcome.into(),
        Err(error) => {
            warn!(%error, "principal provisioning failed, continuing");
            PrincipalStatus::Failed {
                reason: error.to_string(),
            }
        }
    };

    let db = store
        .database(&plan.database)
        .map_err(|e| Error::DatabaseUnavailable {
            database: plan.database.clone(),
            source: Box::new(e),
        })?;
    let specs = collection_specs();

    info!(database = %plan.database, "resetting collections");
    let collections = reset_collections(&db, &specs)?;

    info!(database = %plan.database, "building indexes");
    let indexes = build_indexes(&db, &specs)?;

    let seed = if plan.seed {
        info!(database = %plan.database, "loading seed data");
        Some(load_seed(&db, &specs, &sample_records()))
    } else {
        None
    };

    Ok(SetupReport {
        principal: PrincipalReport {
            name: plan.principal.name.clone(),
            status,
        },
        database: plan.database.clone(),
        collections,
        indexes,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, SqliteStore};
    use tempfile::TempDir;

    fn plan(seed: bool) -> SetupPlan {
        SetupPlan {
            principal: PrincipalSpec {
                name: "persona_db".to_string(),
                secret: "persona_db".to_string(),
                database: DATABASE.to_string(),
                grant_db_admin: false,
            },
            database: DATABASE.to_string(),
            seed,
        }
    }

    #[test]
    fn test_run_setup_from_empty() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path()).unwrap();

        let report = run_setup(&store, &plan(true)).unwrap();
        assert!(report.principal_created());
        assert_eq!(report.collections.len(), 4);
        assert_eq!(report.indexes.len(), 4);
        assert_eq!(report.seed.as_ref().unwrap().inserted(), 14);

        let db = store.database(DATABASE).unwrap();
        assert_eq!(db.count_documents(PERSONA).unwrap(), 8);
    }

    #[test]
    fn test_run_setup_twice_resets_data() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path()).unwrap();
        run_setup(&store, &plan(true)).unwrap();

        let report = run_setup(&store, &plan(false)).unwrap();
        assert_eq!(report.principal.status, PrincipalStatus::AlreadyExists);
        assert!(report.collections.iter().all(|c| c.dropped));
        assert!(report.seed.is_none());

        let db = store.database(DATABASE).unwrap();
        for spec in collection_specs() {
            assert_eq!(db.count_documents(spec.name).unwrap(), 0);
        }
    }

    #[test]
    fn test_provisioning_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path()).unwrap();
        let mut plan = plan(true);
        plan.principal.secret.clear();

        let report = run_setup(&store, &plan).unwrap();
        assert!(matches!(
            report.principal.status,
            PrincipalStatus::Failed { .. }
        ));
        assert_eq!(report.seed.unwrap().inserted(), 14);
    }

    #[test]
    fn test_unopenable_database_names_the_stage() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path()).unwrap();
        let mut plan = plan(true);
        plan.database = "admin".to_string();

        match run_setup(&store, &plan) {
            Err(error @ Error::DatabaseUnavailable { .. }) => {
                assert!(error.to_string().starts_with("schema definition failed"));
                let Error::DatabaseUnavailable { database, source } = error else {
                    unreachable!()
                };
                assert_eq!(database, "admin");
                assert!(matches!(*source, Error::InvalidName(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_report_serializes_status() {
        let report = PrincipalReport {
            name: "persona_db".to_string(),
            status: PrincipalStatus::Failed {
                reason: "boom".to_string(),
            },
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "boom");
    }
}
