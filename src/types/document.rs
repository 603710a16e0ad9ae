use serde_json::{Map, Value};

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Field carrying the discriminator tag used for polymorphic decoding.
pub const CLASS_FIELD: &str = "_class";

/// Canonical storage key for an identity value. `1` and `"1"` are distinct keys.
#[must_use]
pub fn id_key(id: &Value) -> String {
    id.to_string()
}

/// Human-readable rendering of an identity value for reports and errors.
#[must_use]
pub fn display_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders the identity of a document, or `<no _id>` when it has none.
#[must_use]
pub fn document_label(doc: &Document) -> String {
    doc.get(ID_FIELD)
        .map(display_id)
        .unwrap_or_else(|| "<no _id>".to_string())
}

/// Serde adapter for optional dates stored as extended JSON: `{"$date": "<rfc3339>"}`.
pub mod ext_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct ExtDate {
        #[serde(rename = "$date")]
        date: DateTime<Utc>,
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|date| ExtDate { date }).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<ExtDate>::deserialize(deserializer)?.map(|ext| ext.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_key_distinguishes_types() {
        assert_eq!(id_key(&json!(1)), "1");
        assert_eq!(id_key(&json!("1")), "\"1\"");
        assert_ne!(id_key(&json!(1)), id_key(&json!("1")));
    }

    #[test]
    fn test_display_id() {
        assert_eq!(display_id(&json!("3101234567")), "3101234567");
        assert_eq!(display_id(&json!(123456789)), "123456789");
    }

    #[test]
    fn test_document_label_without_id() {
        let doc = Document::new();
        assert_eq!(document_label(&doc), "<no _id>");
    }
}
