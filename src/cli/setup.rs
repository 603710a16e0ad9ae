use serde::Serialize;

use crate::auth::generate_secret;
use crate::setup::{
    CatalogReport, PrincipalStatus, SeedReport, SetupReport, collection_specs, load_seed,
    profession_catalog, run_setup, sample_records, upsert_professions,
};

use super::{StoreArgs, confirm_action, init_database, load_config, open_store};

#[derive(Serialize)]
struct SetupOutput<'a> {
    #[serde(flatten)]
    report: &'a SetupReport,
    /// Only present when the secret was generated for a newly created principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_password: Option<&'a str>,
}

pub fn run_setup_command(
    args: StoreArgs,
    skip_seed: bool,
    yes: bool,
    non_interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    let message = format!(
        "This drops every persona collection in '{}' ({}) and recreates them empty. Continue?",
        config.database,
        config.data_dir.display()
    );
    if !confirm_action(&message, yes, non_interactive)? {
        println!("Setup cancelled.");
        return Ok(());
    }

    let (secret, generated) = match config.configured_password() {
        Some(password) => (password.to_string(), false),
        None => (generate_secret(), true),
    };

    let store = open_store(&config)?;
    let report = run_setup(&store, &config.setup_plan(secret.clone(), !skip_seed))?;

    let generated_password =
        (generated && report.principal_created()).then_some(secret.as_str());

    if json {
        let output = SetupOutput {
            report: &report,
            generated_password,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("Persona Database Setup");
    println!("{}", "─".repeat(22));

    let principal = match &report.principal.status {
        PrincipalStatus::Created => "created".to_string(),
        PrincipalStatus::AlreadyExists => "already exists, skipped".to_string(),
        PrincipalStatus::Failed { reason } => format!("FAILED ({reason})"),
    };
    println!("Principal:   {} {principal}", report.principal.name);
    println!("Database:    {}", report.database);

    println!();
    println!("Collections:");
    for reset in &report.collections {
        let note = if reset.dropped { " (dropped and recreated)" } else { "" };
        println!("  {}{note}", reset.collection);
    }

    println!();
    println!("Indexes:");
    for index in &report.indexes {
        let unique = if index.unique { " unique" } else { "" };
        let note = if index.created { "" } else { " (already present)" };
        println!("  {}.{}{unique}{note}", index.collection, index.index);
    }

    if let Some(seed) = &report.seed {
        println!();
        print_seed_report(seed);
    }

    if let Some(password) = generated_password {
        println!();
        println!("========================================");
        println!("Password for '{}' (save this, it won't be shown again):", report.principal.name);
        println!();
        println!("  {password}");
        println!();
        println!("========================================");
    }
    println!();

    Ok(())
}

pub fn run_seed(args: StoreArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let (_store, db) = init_database(&config)?;

    let report = load_seed(&db, &collection_specs(), &sample_records());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print_seed_report(&report);
        println!();
    }
    Ok(())
}

pub fn run_catalog(args: StoreArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let (_store, db) = init_database(&config)?;

    let report = upsert_professions(&db, &profession_catalog())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_catalog_report(&report);
    }
    Ok(())
}

fn print_seed_report(report: &SeedReport) {
    println!("Seed data:");
    for collection in &report.collections {
        println!(
            "  {:<10} {}/{} inserted",
            collection.collection, collection.inserted, collection.attempted
        );
        for failure in &collection.failures {
            println!("    rejected {}: {}", failure.id, failure.reason);
        }
    }
    println!(
        "  Total: {} inserted, {} rejected",
        report.inserted(),
        report.rejected()
    );
}

fn print_catalog_report(report: &CatalogReport) {
    println!();
    println!(
        "Profession catalog: {} inserted, {} replaced, {} in collection",
        report.inserted, report.replaced, report.total
    );
    for failure in &report.failures {
        println!("  rejected {}: {}", failure.id, failure.reason);
    }
    println!();
}
