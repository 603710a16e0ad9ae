use crate::store::IndexModel;
use crate::types::document::CLASS_FIELD;
use crate::validator::{BsonType, JsonSchema, PropertySchema};

pub const DATABASE: &str = "persona_db";

pub const PERSONA: &str = "persona";
pub const PROFESION: &str = "profesion";
pub const TELEFONO: &str = "telefono";
pub const ESTUDIOS: &str = "estudios";

/// A field holding the `_id` of a document in another collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub collection: &'static str,
}

/// Everything the bootstrap knows about one collection: its validator
/// contract, secondary indexes and outgoing references.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub validator: JsonSchema,
    pub indexes: Vec<IndexModel>,
    pub references: &'static [Reference],
}

const PHONE_REFERENCES: &[Reference] = &[Reference {
    field: "duenio",
    collection: PERSONA,
}];

const STUDY_REFERENCES: &[Reference] = &[
    Reference {
        field: "ccPer",
        collection: PERSONA,
    },
    Reference {
        field: "idProf",
        collection: PROFESION,
    },
];

fn persona_validator() -> JsonSchema {
    JsonSchema::object()
        .required(["_id", "nombre", "apellido", "genero"])
        .property("_id", PropertySchema::of(BsonType::Int))
        .property("nombre", PropertySchema::of(BsonType::String))
        .property("apellido", PropertySchema::of(BsonType::String))
        .property(
            "genero",
            PropertySchema::of(BsonType::String).one_of(["M", "F"]),
        )
        .property("edad", PropertySchema::nullable(BsonType::Int))
        .property(CLASS_FIELD, PropertySchema::of(BsonType::String))
}

fn profesion_validator() -> JsonSchema {
    JsonSchema::object()
        .required(["_id", "nombre"])
        .property("_id", PropertySchema::of(BsonType::Int))
        .property("nombre", PropertySchema::of(BsonType::String))
        .property("descripcion", PropertySchema::nullable(BsonType::String))
        .property(CLASS_FIELD, PropertySchema::of(BsonType::String))
}

fn telefono_validator() -> JsonSchema {
    JsonSchema::object()
        .required(["_id", "oper", "duenio"])
        .property("_id", PropertySchema::of(BsonType::String))
        .property("oper", PropertySchema::of(BsonType::String))
        .property("duenio", PropertySchema::of(BsonType::Int))
        .property(CLASS_FIELD, PropertySchema::of(BsonType::String))
}

fn estudios_validator() -> JsonSchema {
    JsonSchema::object()
        .required(["_id", "idProf", "ccPer"])
        .property("_id", PropertySchema::of(BsonType::String))
        .property("idProf", PropertySchema::of(BsonType::Int))
        .property("ccPer", PropertySchema::of(BsonType::Int))
        .property("fecha", PropertySchema::nullable(BsonType::Date))
        .property("univer", PropertySchema::nullable(BsonType::String))
        .property(CLASS_FIELD, PropertySchema::of(BsonType::String))
}

/// The four persona collections, parents before the collections that
/// reference them.
pub fn collection_specs() -> Vec<CollectionSpec> {
    vec![
        CollectionSpec {
            name: PERSONA,
            validator: persona_validator(),
            indexes: Vec::new(),
            references: &[],
        },
        CollectionSpec {
            name: PROFESION,
            validator: profesion_validator(),
            indexes: Vec::new(),
            references: &[],
        },
        CollectionSpec {
            name: TELEFONO,
            validator: telefono_validator(),
            indexes: vec![IndexModel::ascending(&["duenio"])],
            references: PHONE_REFERENCES,
        },
        CollectionSpec {
            name: ESTUDIOS,
            validator: estudios_validator(),
            indexes: vec![
                IndexModel::ascending(&["ccPer"]),
                IndexModel::ascending(&["idProf"]),
                IndexModel::ascending(&["ccPer", "idProf"]).unique(true),
            ],
            references: STUDY_REFERENCES,
        },
    ]
}

/// Looks up the `CollectionSpec` named `collection`.
#[must_use]
pub fn find_spec<'a>(specs: &'a [CollectionSpec], collection: &str) -> Option<&'a CollectionSpec> {
    specs.iter().find(|spec| spec.name == collection)
}
