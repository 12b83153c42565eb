//! # fest CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fest_cli::export::{run_export, ExportArgs};
use fest_cli::setup_admin::{run_setup_admin, SetupAdminArgs};
use fest_cli::validate::{run_validate, ValidateArgs};

/// Fest portal operator CLI.
///
/// Admin account seeding, offline registration validation, and team-list
/// exports against the portal database.
#[derive(Parser, Debug)]
#[command(name = "fest", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed or reset the admin account in the database.
    SetupAdmin(SetupAdminArgs),

    /// Validate a registration payload offline.
    Validate(ValidateArgs),

    /// Export the team list as CSV or JSON.
    Export(ExportArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::SetupAdmin(args) => run_setup_admin(args).await,
        Commands::Validate(args) => run_validate(&args),
        Commands::Export(args) => run_export(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
