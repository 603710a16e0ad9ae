use serde::Serialize;
use tracing::info;

use super::collections::CollectionSpec;
use crate::error::{Error, Result};
use crate::store::Database;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReset {
    pub collection: String,
    /// Whether a collection of the same name existed and was dropped.
    pub dropped: bool,
}

fn schema_error(collection: &str, source: Error) -> Error {
    Error::SchemaDefinition {
        collection: collection.to_string(),
        source: Box::new(source),
    }
}

/// Drops every collection in `specs`, then recreates each bound to its
/// validator. All existing documents in those collections are destroyed.
pub fn reset_collections(
    db: &impl Database,
    specs: &[CollectionSpec],
) -> Result<Vec<CollectionReset>> {
    let mut resets = Vec::with_capacity(specs.len());

    for spec in specs {
        let dropped = db
            .drop_collection(spec.name)
            .map_err(|e| schema_error(spec.name, e))?;
        if dropped {
            info!(database = db.name(), collection = spec.name, "dropped existing collection");
        }
        resets.push(CollectionReset {
            collection: spec.name.to_string(),
            dropped,
        });
    }

    for spec in specs {
        db.create_collection(spec.name, &spec.validator)
            .map_err(|e| schema_error(spec.name, e))?;
        info!(database = db.name(), collection = spec.name, "created collection");
    }

    Ok(resets)
}
