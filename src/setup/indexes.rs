use serde::Serialize;
use tracing::info;

use super::collections::CollectionSpec;
use crate::error::{Error, Result};
use crate::store::{Database, IndexOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub collection: String,
    pub index: String,
    pub unique: bool,
    /// False when an identical index was already in place.
    pub created: bool,
}

/// Builds every secondary index in `specs`. A failure aborts the stage; no
/// constraint is ever skipped.
pub fn build_indexes(db: &impl Database, specs: &[CollectionSpec]) -> Result<Vec<IndexReport>> {
    let mut built = Vec::new();

    for spec in specs {
        for index in &spec.indexes {
            let outcome = db
                .create_index(spec.name, index)
                .map_err(|e| Error::IndexBuild {
                    collection: spec.name.to_string(),
                    index: index.name.clone(),
                    source: Box::new(e),
                })?;

            let created = outcome == IndexOutcome::Created;
            if created {
                info!(
                    collection = spec.name,
                    index = %index.name,
                    unique = index.unique,
                    "created index"
                );
            } else {
                info!(collection = spec.name, index = %index.name, "index already present");
            }
            built.push(IndexReport {
                collection: spec.name.to_string(),
                index: index.name.clone(),
                unique: index.unique,
                created,
            });
        }
    }

    Ok(built)
}
