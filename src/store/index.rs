use serde::{Deserialize, Serialize};

use super::name::validate_field_name;
use crate::error::{Error, Result};
use crate::types::document::ID_FIELD;

/// Name of the implicit unique index every collection has on `_id`.
pub const IDENTITY_INDEX: &str = "_id_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexModel {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub unique: bool,
}

impl IndexModel {
    /// A non-unique ascending index over `fields`, named after its keys.
    pub fn ascending(fields: &[&str]) -> Self {
        let keys: Vec<IndexKey> = fields
            .iter()
            .map(|field| IndexKey {
                field: (*field).to_string(),
                order: SortOrder::Ascending,
            })
            .collect();
        Self {
            name: default_name(&keys),
            keys,
            unique: false,
        }
    }

    #[must_use]
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn identity() -> Self {
        Self::ascending(&[ID_FIELD])
            .named(IDENTITY_INDEX)
            .unique(true)
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.name == IDENTITY_INDEX
    }

    pub fn check(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(Error::InvalidName(format!(
                "index '{}' has no keys",
                self.name
            )));
        }
        if self.name.is_empty() {
            return Err(Error::InvalidName("index name cannot be empty".to_string()));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::InvalidName(format!(
                "index name '{}' can only contain alphanumeric characters, hyphens, and underscores",
                self.name
            )));
        }
        for key in &self.keys {
            validate_field_name(&key.field)?;
        }
        Ok(())
    }
}

/// `ccPer_1_idProf_1` style name derived from the key pattern.
#[must_use]
pub fn default_name(keys: &[IndexKey]) -> String {
    keys.iter()
        .map(|k| format!("{}_{}", k.field, k.order.as_i8()))
        .collect::<Vec<_>>()
        .join("_")
}
