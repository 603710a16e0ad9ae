mod index;
pub mod name;
mod schema;
mod sqlite;

pub use index::{IDENTITY_INDEX, IndexKey, IndexModel, SortOrder};
pub use sqlite::{DEFAULT_ADMIN_DATABASE, SqliteDatabase, SqliteStore};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::*;
use crate::validator::JsonSchema;

/// Store is the administrative handle: principals and database selection.
pub trait Store: Send + Sync {
    type Database: Database;

    fn initialize(&self) -> Result<()>;

    /// Selects a logical database by name, creating it on first use.
    fn database(&self, name: &str) -> Result<Self::Database>;

    // Principal operations
    fn create_principal(&self, principal: &NewPrincipal) -> Result<Principal>;
    fn get_principal(&self, name: &str) -> Result<Option<Principal>>;
    fn authenticate(&self, name: &str, secret: &str) -> Result<Option<Principal>>;
}

/// Database is a handle to one selected logical database.
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    // Collection operations
    fn create_collection(&self, name: &str, validator: &JsonSchema) -> Result<()>;
    fn drop_collection(&self, name: &str) -> Result<bool>;
    fn list_collections(&self) -> Result<Vec<String>>;
    fn collection_validator(&self, name: &str) -> Result<Option<JsonSchema>>;

    // Index operations
    /// Builds `index`, or leaves an identical existing definition in place.
    fn create_index(&self, collection: &str, index: &IndexModel) -> Result<IndexOutcome>;
    fn list_indexes(&self, collection: &str) -> Result<Vec<IndexModel>>;

    // Document operations
    fn insert_many(
        &self,
        collection: &str,
        docs: &[Document],
        options: InsertManyOptions,
    ) -> Result<InsertManyResult>;
    fn upsert_by_id(&self, collection: &str, doc: &Document) -> Result<UpsertOutcome>;
    fn find_by_id(&self, collection: &str, id: &Value) -> Result<Option<Document>>;
    fn count_documents(&self, collection: &str) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertManyOptions {
    /// Stop at the first failing document instead of attempting the rest.
    pub ordered: bool,
}

impl Default for InsertManyOptions {
    fn default() -> Self {
        Self { ordered: true }
    }
}

impl InsertManyOptions {
    #[must_use]
    pub const fn unordered() -> Self {
        Self { ordered: false }
    }
}

/// A document rejected by `insert_many`, by position in the submitted batch.
#[derive(Debug)]
pub struct WriteFailure {
    pub index: usize,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<Value>,
    pub failures: Vec<WriteFailure>,
}

impl InsertManyResult {
    #[must_use]
    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Created,
    AlreadyExists,
}
