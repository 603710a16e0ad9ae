use clap::Parser;
use tracing_subscriber::EnvFilter;

use personadb::cli::{
    Commands, run_catalog, run_info, run_seed, run_setup_command, run_verify,
};

#[derive(Parser)]
#[command(name = "personadb")]
#[command(about = "Bootstrap the persona document database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("personadb=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Setup {
            store,
            skip_seed,
            yes,
            non_interactive,
            json,
        } => run_setup_command(store, skip_seed, yes, non_interactive, json)?,
        Commands::Seed { store, json } => run_seed(store, json)?,
        Commands::Catalog { store, json } => run_catalog(store, json)?,
        Commands::Info { store, json } => run_info(store, json)?,
        Commands::Verify {
            store,
            non_interactive,
        } => run_verify(store, non_interactive)?,
    }

    Ok(())
}
