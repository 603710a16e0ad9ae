//! End-to-end tests of the bootstrap procedure against an on-disk store.

use personadb::error::Error;
use personadb::setup::{
    DATABASE, ESTUDIOS, FailureKind, PERSONA, PROFESION, PrincipalSpec, PrincipalStatus,
    SetupPlan, TELEFONO, build_indexes, collection_specs, load_seed, run_setup, sample_records,
};
use personadb::store::{Database, InsertManyOptions, SqliteStore, Store};
use personadb::types::{Record, Study};
use serde_json::json;
use tempfile::TempDir;

fn plan() -> SetupPlan {
    SetupPlan {
        principal: PrincipalSpec {
            name: "persona_db".to_string(),
            secret: "persona_db".to_string(),
            database: DATABASE.to_string(),
            grant_db_admin: false,
        },
        database: DATABASE.to_string(),
        seed: true,
    }
}

fn index_names(db: &impl Database, collection: &str) -> Vec<String> {
    db.list_indexes(collection)
        .unwrap()
        .into_iter()
        .map(|index| index.name)
        .collect()
}

#[test]
fn setup_from_empty_store() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path()).unwrap();

    let report = run_setup(&store, &plan()).unwrap();
    assert_eq!(report.principal.status, PrincipalStatus::Created);

    let db = store.database(DATABASE).unwrap();
    assert_eq!(
        db.list_collections().unwrap(),
        vec![ESTUDIOS, PERSONA, PROFESION, TELEFONO]
    );
    assert_eq!(index_names(&db, TELEFONO), vec!["_id_", "duenio_1"]);
    assert_eq!(
        index_names(&db, ESTUDIOS),
        vec!["_id_", "ccPer_1", "idProf_1", "ccPer_1_idProf_1"]
    );
    assert_eq!(index_names(&db, PERSONA), vec!["_id_"]);

    for (collection, expected) in [(PERSONA, 8), (PROFESION, 2), (TELEFONO, 2), (ESTUDIOS, 2)] {
        assert_eq!(db.count_documents(collection).unwrap(), expected);
    }

    let principal = store.authenticate("persona_db", "persona_db").unwrap().unwrap();
    assert_eq!(principal.roles.len(), 1);
    assert_eq!(principal.roles[0].db, DATABASE);
}

#[test]
fn seeded_documents_decode_by_discriminator() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path()).unwrap();
    run_setup(&store, &plan()).unwrap();
    let db = store.database(DATABASE).unwrap();

    let doc = db.find_by_id(ESTUDIOS, &json!("987654321_2")).unwrap().unwrap();
    match Record::from_document(doc).unwrap() {
        Record::Study(study) => {
            assert_eq!(study.person, 987654321);
            assert_eq!(study.profession, 2);
            assert_eq!(study.institution.as_deref(), Some("Universidad Nacional"));
        }
        other => panic!("unexpected record: {other:?}"),
    }

    let doc = db.find_by_id(PERSONA, &json!(987654321)).unwrap().unwrap();
    assert!(!doc.contains_key("edad"));
    assert!(matches!(Record::from_document(doc).unwrap(), Record::Person(_)));
}

#[test]
fn rerun_setup_resets_and_reseeds() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path()).unwrap();
    run_setup(&store, &plan()).unwrap();

    let db = store.database(DATABASE).unwrap();
    let extra = Record::from(Study::new(606060606, 1)).to_document().unwrap();
    db.insert_many(ESTUDIOS, &[extra], InsertManyOptions::default())
        .unwrap();
    assert_eq!(db.count_documents(ESTUDIOS).unwrap(), 3);

    let report = run_setup(&store, &plan()).unwrap();
    assert_eq!(report.principal.status, PrincipalStatus::AlreadyExists);
    assert_eq!(report.seed.unwrap().rejected(), 0);
    assert_eq!(db.count_documents(ESTUDIOS).unwrap(), 2);

    for spec in collection_specs() {
        assert_eq!(
            db.collection_validator(spec.name).unwrap(),
            Some(spec.validator)
        );
    }
}

#[test]
fn seed_without_reset_rejects_duplicates() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path()).unwrap();
    run_setup(&store, &plan()).unwrap();
    let db = store.database(DATABASE).unwrap();

    let report = load_seed(&db, &collection_specs(), &sample_records());
    assert_eq!(report.inserted(), 0);
    assert_eq!(report.rejected(), 14);
    for collection in &report.collections {
        assert!(collection
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::DuplicateKey));
    }
}

#[test]
fn study_pair_is_unique() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path()).unwrap();
    run_setup(&store, &plan()).unwrap();
    let db = store.database(DATABASE).unwrap();

    let first = Record::from(Study::new(321654987, 1)).to_document().unwrap();
    let mut second = first.clone();
    second.insert("_id".to_string(), json!("321654987_1_bis"));

    let result = db
        .insert_many(ESTUDIOS, &[first, second], InsertManyOptions::unordered())
        .unwrap();
    assert_eq!(result.inserted_count(), 1);
    assert!(matches!(
        &result.failures[0].error,
        Error::DuplicateKey { index, .. } if index == "ccPer_1_idProf_1"
    ));
}

#[test]
fn index_build_over_violating_data_is_fatal() {
    let temp = TempDir::new().unwrap();
    let store = SqliteStore::new(temp.path()).unwrap();
    let mut plan = plan();
    plan.seed = false;
    run_setup(&store, &plan).unwrap();
    let db = store.database(DATABASE).unwrap();

    // Recreate estudios without indexes, then load clashing pairs.
    let specs = collection_specs();
    let estudios = specs.iter().find(|s| s.name == ESTUDIOS).unwrap();
    db.drop_collection(ESTUDIOS).unwrap();
    db.create_collection(ESTUDIOS, &estudios.validator).unwrap();

    let docs: Vec<_> = ["a", "b"]
        .iter()
        .map(|id| {
            let mut doc = Record::from(Study::new(123456789, 1)).to_document().unwrap();
            doc.insert("_id".to_string(), json!(id));
            doc
        })
        .collect();
    db.insert_many(ESTUDIOS, &docs, InsertManyOptions::default())
        .unwrap();

    let err = build_indexes(&db, &specs).unwrap_err();
    assert!(matches!(err, Error::IndexBuild { ref index, .. } if index == "ccPer_1_idProf_1"));
}
