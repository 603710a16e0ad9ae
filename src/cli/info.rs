use serde::Serialize;

use crate::setup::collection_specs;
use crate::store::{Database, Store};

use super::{StoreArgs, load_config, open_store};

#[derive(Serialize)]
struct CollectionOutput {
    name: String,
    exists: bool,
    has_validator: bool,
    indexes: Vec<String>,
    documents: u64,
}

#[derive(Serialize)]
struct PrincipalOutput {
    name: String,
    exists: bool,
    roles: Vec<String>,
    created_at: Option<String>,
}

#[derive(Serialize)]
struct DatabaseInfo {
    data_dir: String,
    database: String,
    database_exists: bool,
    principal: PrincipalOutput,
    collections: Vec<CollectionOutput>,
}

pub fn run_info(args: StoreArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = open_store(&config)?;
    store.initialize()?;

    let principal = store.get_principal(&config.app_user)?;
    let principal = PrincipalOutput {
        name: config.app_user.clone(),
        exists: principal.is_some(),
        roles: principal
            .as_ref()
            .map(|p| p.roles.iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
        created_at: principal.map(|p| p.created_at.to_rfc3339()),
    };

    let database_exists = store.database_exists(&config.database);
    let mut collections = Vec::new();
    if database_exists {
        let db = store.database(&config.database)?;
        let present = db.list_collections()?;

        for spec in collection_specs() {
            let exists = present.iter().any(|name| name == spec.name);
            let (has_validator, indexes, documents) = if exists {
                (
                    db.collection_validator(spec.name)?.is_some(),
                    db.list_indexes(spec.name)?
                        .into_iter()
                        .map(|index| index.name)
                        .collect(),
                    db.count_documents(spec.name)?,
                )
            } else {
                (false, Vec::new(), 0)
            };

            collections.push(CollectionOutput {
                name: spec.name.to_string(),
                exists,
                has_validator,
                indexes,
                documents,
            });
        }
    }

    let info = DatabaseInfo {
        data_dir: config.data_dir.display().to_string(),
        database: config.database.clone(),
        database_exists,
        principal,
        collections,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("Persona Database Status");
    println!("{}", "─".repeat(23));
    println!("Data dir:    {}", info.data_dir);
    println!(
        "Database:    {}{}",
        info.database,
        if info.database_exists { "" } else { " (not created)" }
    );
    if info.principal.exists {
        println!(
            "Principal:   {} [{}]",
            info.principal.name,
            info.principal.roles.join(", ")
        );
    } else {
        println!("Principal:   {} (missing)", info.principal.name);
    }

    if !info.collections.is_empty() {
        println!();
        for collection in &info.collections {
            if collection.exists {
                println!(
                    "  {:<10} {:>4} docs  indexes: {}",
                    collection.name,
                    collection.documents,
                    collection.indexes.join(", ")
                );
            } else {
                println!("  {:<10} missing", collection.name);
            }
        }
    }
    println!();

    Ok(())
}
