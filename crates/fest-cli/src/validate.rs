//! # Validate Subcommand
//!
//! Runs a registration payload through the same validator the API uses,
//! without touching the network or the database. Useful for checking bulk
//! import files before submitting them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fest_core::validate::validate_registration;
use fest_core::RegistrationForm;

/// Arguments for the `fest validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to a JSON registration form, or `-` for stdin.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the form is valid, 1 on validation failure,
/// 2 on operational error.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let raw = if args.path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(&args.path)
            .with_context(|| format!("failed to read {}", args.path.display()))?
    };

    let form: RegistrationForm =
        serde_json::from_str(&raw).context("payload is not a registration form")?;

    match validate_registration(&form) {
        Ok(team) => {
            println!(
                "ok: {} ({}, {} participants, sports: {})",
                team.team_name,
                team.category,
                team.participant_count(),
                team.sports
                    .iter()
                    .map(|s| s.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(0)
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            eprintln!("{} validation error(s)", errors.len());
            Ok(1)
        }
    }
}
