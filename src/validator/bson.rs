use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// BSON type aliases understood by validator contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsonType {
    Object,
    Array,
    String,
    Int,
    Long,
    Double,
    Bool,
    Date,
    Null,
}

impl BsonType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BsonType::Object => "object",
            BsonType::Array => "array",
            BsonType::String => "string",
            BsonType::Int => "int",
            BsonType::Long => "long",
            BsonType::Double => "double",
            BsonType::Bool => "bool",
            BsonType::Date => "date",
            BsonType::Null => "null",
        }
    }

    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            BsonType::Object => value.as_object().is_some_and(|o| !is_ext_date(o)),
            BsonType::Array => value.is_array(),
            BsonType::String => value.is_string(),
            BsonType::Int => value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
            BsonType::Long => value.as_i64().is_some(),
            BsonType::Double => value.is_f64(),
            BsonType::Bool => value.is_boolean(),
            BsonType::Date => value.as_object().is_some_and(is_ext_date),
            BsonType::Null => value.is_null(),
        }
    }

    /// The narrowest type name describing `value`, for violation messages.
    #[must_use]
    pub fn name_of(value: &Value) -> &'static str {
        [
            BsonType::Null,
            BsonType::Bool,
            BsonType::Int,
            BsonType::Long,
            BsonType::Double,
            BsonType::String,
            BsonType::Date,
            BsonType::Array,
            BsonType::Object,
        ]
        .into_iter()
        .find(|t| t.matches(value))
        .map_or("unknown", BsonType::as_str)
    }
}

/// `{"$date": "<rfc3339>"}` is the extended-JSON encoding of a BSON date.
fn is_ext_date(object: &Map<String, Value>) -> bool {
    object.len() == 1
        && object
            .get("$date")
            .and_then(Value::as_str)
            .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_and_long_ranges() {
        assert!(BsonType::Int.matches(&json!(2_147_483_647)));
        assert!(!BsonType::Int.matches(&json!(2_147_483_648_i64)));
        assert!(BsonType::Long.matches(&json!(2_147_483_648_i64)));
        assert!(!BsonType::Int.matches(&json!(1.5)));
    }

    #[test]
    fn test_date_is_not_object() {
        let date = json!({ "$date": "2020-01-15T00:00:00Z" });
        assert!(BsonType::Date.matches(&date));
        assert!(!BsonType::Object.matches(&date));
        assert!(!BsonType::Date.matches(&json!({ "$date": "yesterday" })));
        assert!(!BsonType::Date.matches(&json!("2020-01-15T00:00:00Z")));
    }

    #[test]
    fn test_name_of() {
        assert_eq!(BsonType::name_of(&json!(null)), "null");
        assert_eq!(BsonType::name_of(&json!(3)), "int");
        assert_eq!(BsonType::name_of(&json!("x")), "string");
        assert_eq!(BsonType::name_of(&json!({ "a": 1 })), "object");
    }
}
