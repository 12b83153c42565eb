//! # Export Subcommand
//!
//! Dumps the team list straight from Postgres, bypassing the API. The CSV
//! output matches `/v1/admin/export/teams.csv` byte for byte.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use fest_api::state::TeamRecord;
use fest_core::export::teams_to_csv;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Arguments for the `fest export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output format.
    #[arg(long, value_enum, default_value = "csv")]
    pub format: ExportFormat,

    /// Write to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Postgres connection string. Defaults to DATABASE_URL.
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Execute the export subcommand.
pub async fn run_export(args: ExportArgs) -> Result<u8> {
    let url = crate::resolve_database_url(args.database_url)?;
    let pool = fest_api::db::init_pool(&url).await?;

    let mut teams = fest_api::db::teams::load_all(&pool).await?;
    teams.sort_by(|a, b| a.team_name.cmp(&b.team_name));

    let rendered = match args.format {
        ExportFormat::Csv => {
            let summaries: Vec<_> = teams.iter().map(TeamRecord::summary).collect();
            teams_to_csv(&summaries)
        }
        ExportFormat::Json => serde_json::to_string_pretty(&teams)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {} teams to {}", teams.len(), path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(0)
}
