use chrono::{TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::collections::{CollectionSpec, find_spec};
use crate::error::{Error, Result};
use crate::store::{Database, InsertManyOptions};
use crate::types::document::{display_id, document_label};
use crate::types::{Document, Gender, Person, Phone, Profession, Record, Study};

fn person(id: i32, first_name: &str, last_name: &str, gender: Gender, age: Option<i32>) -> Record {
    Person {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        gender,
        age,
    }
    .into()
}

fn profession(id: i32, name: &str, description: &str) -> Record {
    Profession {
        id,
        name: name.to_string(),
        description: Some(description.to_string()),
    }
    .into()
}

fn phone(number: &str, operator: &str, owner: i32) -> Record {
    Phone {
        number: number.to_string(),
        operator: operator.to_string(),
        owner,
    }
    .into()
}

fn study(person: i32, profession: i32, (y, m, d): (i32, u32, u32), institution: &str) -> Record {
    let study = Study::new(person, profession).with_institution(institution);
    match Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single() {
        Some(date) => study.with_date(date).into(),
        None => study.into(),
    }
}

/// The fixed sample set: persons, professions, phones and studies, in that
/// order. Every reference resolves within the set.
pub fn sample_records() -> Vec<Record> {
    vec![
        person(123456789, "Pepe", "Perez", Gender::Male, Some(30)),
        person(987654321, "Pepito", "Perez", Gender::Male, None),
        person(321654987, "Pepa", "Juarez", Gender::Female, Some(30)),
        person(147258369, "Pepita", "Juarez", Gender::Female, Some(10)),
        person(963852741, "Fede", "Perez", Gender::Male, Some(18)),
        person(404040404, "Luis", "Gomez", Gender::Male, Some(28)),
        person(505050505, "Sofia", "Hernandez", Gender::Female, Some(33)),
        person(606060606, "David", "Ramirez", Gender::Male, Some(22)),
        profession(
            1,
            "Ingeniero de Sistemas",
            "Profesional en ingeniería de sistemas y computación",
        ),
        profession(2, "Médico", "Profesional en medicina"),
        phone("3101234567", "Claro", 123456789),
        phone("3219876543", "Movistar", 987654321),
        study(123456789, 1, (2020, 1, 15), "Universidad Javeriana"),
        study(987654321, 2, (2019, 6, 20), "Universidad Nacional"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DuplicateKey,
    Validation,
    MissingReference,
    Store,
}

impl FailureKind {
    fn of(error: &Error) -> Self {
        match error {
            Error::DuplicateKey { .. } => FailureKind::DuplicateKey,
            Error::Validation { .. } => FailureKind::Validation,
            Error::MissingReference { .. } => FailureKind::MissingReference,
            _ => FailureKind::Store,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    pub id: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl SeedFailure {
    pub(crate) fn new(id: String, error: &Error) -> Self {
        Self {
            id,
            kind: FailureKind::of(error),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSeedReport {
    pub collection: String,
    pub attempted: usize,
    pub inserted: usize,
    pub failures: Vec<SeedFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub collections: Vec<CollectionSeedReport>,
}

impl SeedReport {
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.collections.iter().map(|c| c.inserted).sum()
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.collections.iter().map(|c| c.failures.len()).sum()
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&CollectionSeedReport> {
        self.collections.iter().find(|c| c.collection == name)
    }
}

/// Finds the first reference of `doc` whose target does not exist.
fn missing_reference(
    db: &impl Database,
    spec: &CollectionSpec,
    doc: &Document,
) -> Result<Option<Error>> {
    for reference in spec.references {
        let Some(key) = doc.get(reference.field) else {
            // Absent required fields are the validator's to report.
            continue;
        };
        if db.find_by_id(reference.collection, key)?.is_none() {
            return Ok(Some(Error::MissingReference {
                id: document_label(doc),
                collection: reference.collection.to_string(),
                key: display_id(key),
            }));
        }
    }
    Ok(None)
}

fn seed_collection(
    db: &impl Database,
    spec: &CollectionSpec,
    docs: &[Document],
    report: &mut CollectionSeedReport,
) -> Result<()> {
    let mut accepted = Vec::with_capacity(docs.len());
    for doc in docs {
        match missing_reference(db, spec, doc)? {
            Some(error) => {
                debug!(collection = spec.name, %error, "reference check failed");
                report
                    .failures
                    .push(SeedFailure::new(document_label(doc), &error));
            }
            None => accepted.push(doc.clone()),
        }
    }

    if accepted.is_empty() {
        return Ok(());
    }

    let result = db.insert_many(spec.name, &accepted, InsertManyOptions::unordered())?;
    report.inserted += result.inserted_count();
    for failure in &result.failures {
        let id = accepted
            .get(failure.index)
            .map(document_label)
            .unwrap_or_else(|| failure.index.to_string());
        report
            .failures
            .push(SeedFailure::new(id, &failure.error));
    }
    Ok(())
}

/// Inserts `records` grouped by collection, following the order of `specs`.
/// Nothing here is fatal: rejected documents and store errors are recorded
/// in the report and the remaining collections are still attempted.
pub fn load_seed(db: &impl Database, specs: &[CollectionSpec], records: &[Record]) -> SeedReport {
    let mut report = SeedReport::default();

    for spec in specs {
        let mut collection = CollectionSeedReport {
            collection: spec.name.to_string(),
            attempted: 0,
            inserted: 0,
            failures: Vec::new(),
        };

        let mut docs = Vec::new();
        for record in records.iter().filter(|r| r.collection() == spec.name) {
            collection.attempted += 1;
            match record.to_document() {
                Ok(doc) => docs.push(doc),
                Err(error) => collection
                    .failures
                    .push(SeedFailure::new("<unencodable>".to_string(), &error)),
            }
        }

        if let Err(error) = seed_collection(db, spec, &docs, &mut collection) {
            warn!(collection = spec.name, %error, "seed batch failed");
            collection
                .failures
                .push(SeedFailure::new(String::from("<batch>"), &error));
        }

        for failure in &collection.failures {
            warn!(collection = spec.name, id = %failure.id, reason = %failure.reason, "seed document rejected");
        }
        info!(
            collection = spec.name,
            attempted = collection.attempted,
            inserted = collection.inserted,
            rejected = collection.failures.len(),
            "seeded collection"
        );
        report.collections.push(collection);
    }

    let orphaned = records
        .iter()
        .filter(|r| find_spec(specs, r.collection()).is_none())
        .count();
    if orphaned > 0 {
        warn!(count = orphaned, "skipped records for unknown collections");
    }

    report
}
