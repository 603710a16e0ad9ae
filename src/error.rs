use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("collection '{0}' does not exist")]
    CollectionNotFound(String),

    #[error("invalid validator: {0}")]
    InvalidValidator(String),

    #[error("index '{name}' already exists on '{collection}' with a different definition")]
    IndexConflict { collection: String, name: String },

    #[error("existing documents in '{collection}' violate unique index '{index}'")]
    IndexViolation { collection: String, index: String },

    #[error("failed to create principal '{name}': {reason}")]
    PrincipalCreation { name: String, reason: String },

    #[error("schema definition failed: cannot open database '{database}': {source}")]
    DatabaseUnavailable {
        database: String,
        #[source]
        source: Box<Error>,
    },

    #[error("schema definition failed for collection '{collection}': {source}")]
    SchemaDefinition {
        collection: String,
        #[source]
        source: Box<Error>,
    },

    #[error("index build failed for '{index}' on '{collection}': {source}")]
    IndexBuild {
        collection: String,
        index: String,
        #[source]
        source: Box<Error>,
    },

    #[error("document {id} failed validation: {}", .violations.join("; "))]
    Validation { id: String, violations: Vec<String> },

    #[error("duplicate key {id} in index '{index}' of '{collection}'")]
    DuplicateKey {
        collection: String,
        index: String,
        id: String,
    },

    #[error("document {id} references missing {collection} {key}")]
    MissingReference {
        id: String,
        collection: String,
        key: String,
    },
}

impl Error {
    /// Per-document write failures that leave the rest of a batch untouched.
    #[must_use]
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::DuplicateKey { .. } | Error::MissingReference { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
