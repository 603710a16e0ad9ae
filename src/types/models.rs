use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RoleGrant;
use super::document::{Document, ext_date};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

/// A person identified by an externally assigned national ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: i32,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "genero")]
    pub gender: Gender,
    #[serde(rename = "edad", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    #[serde(rename = "_id")]
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A phone keyed by its number; `owner` is a person ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    #[serde(rename = "_id")]
    pub number: String,
    #[serde(rename = "oper")]
    pub operator: String,
    #[serde(rename = "duenio")]
    pub owner: i32,
}

/// Links one person to one profession. The ID is `<person>_<profession>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "idProf")]
    pub profession: i32,
    #[serde(rename = "ccPer")]
    pub person: i32,
    #[serde(
        rename = "fecha",
        default,
        skip_serializing_if = "Option::is_none",
        with = "ext_date"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "univer", default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

impl Study {
    pub fn new(person: i32, profession: i32) -> Self {
        Self {
            id: Self::key(person, profession),
            profession,
            person,
            date: None,
            institution: None,
        }
    }

    #[must_use]
    pub fn key(person: i32, profession: i32) -> String {
        format!("{person}_{profession}")
    }

    #[must_use]
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }
}

/// Any persona record, tagged with its `_class` discriminator when stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_class")]
pub enum Record {
    #[serde(rename = "co.edu.javeriana.as.personapp.mongo.document.PersonaDocument")]
    Person(Person),
    #[serde(rename = "co.edu.javeriana.as.personapp.mongo.document.ProfesionDocument")]
    Profession(Profession),
    #[serde(rename = "co.edu.javeriana.as.personapp.mongo.document.TelefonoDocument")]
    Phone(Phone),
    #[serde(rename = "co.edu.javeriana.as.personapp.mongo.document.EstudiosDocument")]
    Study(Study),
}

impl Record {
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            Record::Person(_) => crate::setup::PERSONA,
            Record::Profession(_) => crate::setup::PROFESION,
            Record::Phone(_) => crate::setup::TELEFONO,
            Record::Study(_) => crate::setup::ESTUDIOS,
        }
    }

    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            other => Err(Error::Config(format!(
                "record serialized to a non-object value: {other}"
            ))),
        }
    }

    pub fn from_document(doc: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }
}

impl From<Person> for Record {
    fn from(person: Person) -> Self {
        Record::Person(person)
    }
}

impl From<Profession> for Record {
    fn from(profession: Profession) -> Self {
        Record::Profession(profession)
    }
}

impl From<Phone> for Record {
    fn from(phone: Phone) -> Self {
        Record::Phone(phone)
    }
}

impl From<Study> for Record {
    fn from(study: Study) -> Self {
        Record::Study(study)
    }
}

/// A security principal as stored by the administrative scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub roles: Vec<RoleGrant>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a principal. The secret is hashed by the store.
#[derive(Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub secret: String,
    pub roles: Vec<RoleGrant>,
}

impl std::fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_person_document_shape() {
        let person = Person {
            id: 987654321,
            first_name: "Pepito".to_string(),
            last_name: "Perez".to_string(),
            gender: Gender::Male,
            age: None,
        };

        let doc = Record::from(person).to_document().unwrap();
        assert_eq!(doc["_id"], json!(987654321));
        assert_eq!(doc["nombre"], json!("Pepito"));
        assert_eq!(doc["genero"], json!("M"));
        assert_eq!(
            doc["_class"],
            json!("co.edu.javeriana.as.personapp.mongo.document.PersonaDocument")
        );
        assert!(!doc.contains_key("edad"));
    }

    #[test]
    fn test_study_date_is_extended_json() {
        let date = Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap();
        let study = Study::new(123456789, 1)
            .with_date(date)
            .with_institution("Universidad Javeriana");

        assert_eq!(study.id, "123456789_1");

        let doc = Record::from(study).to_document().unwrap();
        assert_eq!(doc["fecha"], json!({ "$date": "2020-01-15T00:00:00Z" }));
        assert_eq!(doc["idProf"], json!(1));
        assert_eq!(doc["ccPer"], json!(123456789));
    }

    #[test]
    fn test_record_decodes_by_discriminator() {
        let doc = json!({
            "_id": "3101234567",
            "oper": "Claro",
            "duenio": 123456789,
            "_class": "co.edu.javeriana.as.personapp.mongo.document.TelefonoDocument",
        });

        let Value::Object(doc) = doc else {
            unreachable!()
        };
        let record = Record::from_document(doc).unwrap();
        assert_eq!(record.collection(), "telefono");
        match record {
            Record::Phone(phone) => {
                assert_eq!(phone.number, "3101234567");
                assert_eq!(phone.owner, 123456789);
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_record_rejects_unknown_discriminator() {
        let Value::Object(doc) = json!({ "_id": 1, "_class": "Unknown" }) else {
            unreachable!()
        };
        assert!(Record::from_document(doc).is_err());
    }
}
