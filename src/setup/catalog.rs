use serde::Serialize;
use tracing::{info, warn};

use super::collections::PROFESION;
use super::seed::SeedFailure;
use crate::error::Result;
use crate::store::{Database, UpsertOutcome};
use crate::types::{Profession, Record};

fn entry(id: i32, name: &str, description: &str) -> Profession {
    Profession {
        id,
        name: name.to_string(),
        description: Some(description.to_string()),
    }
}

/// The reference profession catalog, keyed by `_id` 1 to 5.
pub fn profession_catalog() -> Vec<Profession> {
    vec![
        entry(
            1,
            "Ingeniero de Sistemas",
            "Profesional especializado en el diseño, desarrollo y mantenimiento de sistemas de software.",
        ),
        entry(
            2,
            "Medico",
            "Profesional de la salud encargado de diagnosticar y tratar enfermedades.",
        ),
        entry(
            3,
            "Abogado",
            "Profesional del derecho que asesora y representa a sus clientes en asuntos legales.",
        ),
        entry(
            4,
            "Arquitecto",
            "Profesional que diseña edificios y espacios urbanos.",
        ),
        entry(
            5,
            "Contador Publico",
            "Profesional encargado de la gestión y auditoría de la información financiera.",
        ),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub inserted: usize,
    pub replaced: usize,
    pub failures: Vec<SeedFailure>,
    /// Documents in the collection after the upserts.
    pub total: u64,
}

/// Upserts each profession by `_id`. Rejected entries are reported; only a
/// failure to count the collection afterwards is returned as an error.
pub fn upsert_professions(db: &impl Database, professions: &[Profession]) -> Result<CatalogReport> {
    let mut report = CatalogReport::default();

    for profession in professions {
        let outcome = Record::from(profession.clone())
            .to_document()
            .and_then(|doc| db.upsert_by_id(PROFESION, &doc));

        match outcome {
            Ok(UpsertOutcome::Inserted) => report.inserted += 1,
            Ok(UpsertOutcome::Replaced) => report.replaced += 1,
            Err(error) => {
                warn!(profession = profession.id, %error, "catalog entry rejected");
                report
                    .failures
                    .push(SeedFailure::new(profession.id.to_string(), &error));
            }
        }
    }

    report.total = db.count_documents(PROFESION)?;
    info!(
        inserted = report.inserted,
        replaced = report.replaced,
        total = report.total,
        "profession catalog applied"
    );
    Ok(report)
}
