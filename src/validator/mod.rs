//! Validator contracts enforced by the store on every write.
//!
//! A [`JsonSchema`] mirrors the `$jsonSchema` subset the persona collections
//! need: a required-field set and per-field BSON type constraints, with
//! nullable unions and enumerations. Additional fields are always allowed.

mod bson;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use bson::BsonType;

use crate::error::{Error, Result};
use crate::types::Document;

/// One BSON type or a union of them, serialized as a string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Single(BsonType),
    Union(Vec<BsonType>),
}

impl TypeSpec {
    #[must_use]
    pub fn types(&self) -> &[BsonType] {
        match self {
            TypeSpec::Single(t) => std::slice::from_ref(t),
            TypeSpec::Union(types) => types,
        }
    }

    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        self.types().iter().any(|t| t.matches(value))
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types().iter().map(|t| t.as_str()).collect();
        f.write_str(&names.join("|"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    pub bson_type: TypeSpec,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

impl PropertySchema {
    pub fn of(bson_type: BsonType) -> Self {
        Self {
            bson_type: TypeSpec::Single(bson_type),
            allowed: None,
        }
    }

    /// The type or an explicit null.
    pub fn nullable(bson_type: BsonType) -> Self {
        Self {
            bson_type: TypeSpec::Union(vec![bson_type, BsonType::Null]),
            allowed: None,
        }
    }

    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn check(&self, field: &str) -> Result<()> {
        if self.bson_type.types().is_empty() {
            return Err(Error::InvalidValidator(format!(
                "field '{field}' declares no bsonType"
            )));
        }
        if let Some(allowed) = &self.allowed {
            if allowed.is_empty() {
                return Err(Error::InvalidValidator(format!(
                    "field '{field}' declares an empty enum"
                )));
            }
            if let Some(bad) = allowed.iter().find(|v| !self.bson_type.matches(v)) {
                return Err(Error::InvalidValidator(format!(
                    "enum value {bad} of field '{field}' is not of type {}",
                    self.bson_type
                )));
            }
        }
        Ok(())
    }

    fn violation(&self, field: &str, value: &Value) -> Option<String> {
        if !self.bson_type.matches(value) {
            return Some(format!(
                "field '{field}' must be of type {}, got {}",
                self.bson_type,
                BsonType::name_of(value)
            ));
        }
        match &self.allowed {
            Some(allowed) if !allowed.contains(value) => Some(format!(
                "field '{field}' value {value} is not one of {}",
                Value::Array(allowed.clone())
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchema {
    pub bson_type: TypeSpec,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

impl JsonSchema {
    /// An object schema with no constraints yet.
    pub fn object() -> Self {
        Self {
            bson_type: TypeSpec::Single(BsonType::Object),
            required: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn property(mut self, field: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(field.into(), schema);
        self
    }

    /// Rejects contracts a store would refuse to bind to a collection.
    pub fn check(&self) -> Result<()> {
        if !self.bson_type.types().contains(&BsonType::Object) {
            return Err(Error::InvalidValidator(format!(
                "root bsonType must be object, got {}",
                self.bson_type
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.required {
            if field.is_empty() {
                return Err(Error::InvalidValidator(
                    "required field names cannot be empty".to_string(),
                ));
            }
            if !seen.insert(field.as_str()) {
                return Err(Error::InvalidValidator(format!(
                    "required field '{field}' is listed twice"
                )));
            }
        }

        for (field, schema) in &self.properties {
            schema.check(field)?;
        }
        Ok(())
    }

    /// Returns every violation of this contract found in `doc`.
    #[must_use]
    pub fn violations(&self, doc: &Document) -> Vec<String> {
        let mut violations: Vec<String> = self
            .required
            .iter()
            .filter(|field| !doc.contains_key(field.as_str()))
            .map(|field| format!("missing required field '{field}'"))
            .collect();

        for (field, schema) in &self.properties {
            if let Some(value) = doc.get(field) {
                violations.extend(schema.violation(field, value));
            }
        }
        violations
    }
}
