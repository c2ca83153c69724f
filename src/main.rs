use anyhow::{Context, Result};
use binx::commands::{self, Validation};
use binx::logging::init_tracing;
use clap::{Parser, Subcommand};
use configuration::load_config;
use std::path::PathBuf;
use std::process::ExitCode;

/// The main entry point for the binx command-line tool.
fn main() -> Result<ExitCode> {
    // BINX__ overrides may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    let _guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Describe => {
            println!("{}", commands::describe(&config)?);
        }
        Commands::Validate(args) => {
            match commands::validate(&config, &args.collection, &args.input)? {
                Validation::Valid {
                    collection,
                    records,
                } => {
                    println!("{} valid record(s) for {}", records, collection);
                }
                Validation::Invalid { collection, errors } => {
                    println!("{} invalid record(s) for {}", errors.len(), collection);
                    println!("{}", commands::errors_table(&errors));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Convert(args) => {
            let written = commands::convert(&config, &args.collection, &args.input, &args.output)?;
            println!("Wrote {} record(s) to {:?}", written, args.output);
        }
    }

    Ok(ExitCode::SUCCESS)
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Declarative in-memory collections: validate and convert record files.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration declaring the collections.
    #[arg(long, short, global = true, default_value = "binx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the declared collections and their fields.
    Describe,
    /// Check an input file against a collection's schema.
    Validate(ValidateArgs),
    /// Validate an input file and write it out in another format.
    Convert(ConvertArgs),
}

#[derive(Parser)]
struct ValidateArgs {
    /// The collection to validate against (e.g., "Building").
    #[arg(long)]
    collection: String,

    /// The input file (.json, .csv or .parquet).
    #[arg(long, short)]
    input: PathBuf,
}

#[derive(Parser)]
struct ConvertArgs {
    /// The collection the records belong to (e.g., "Building").
    #[arg(long)]
    collection: String,

    /// The input file (.json, .csv or .parquet).
    #[arg(long, short)]
    input: PathBuf,

    /// The output file; its extension picks the format.
    #[arg(long, short)]
    output: PathBuf,
}
