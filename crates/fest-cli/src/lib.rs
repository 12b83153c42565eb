//! # fest-cli
//!
//! Operator tooling for the fest portal. Three subcommands:
//!
//! - `setup-admin` — seed (or reset) the admin account in the database
//! - `validate` — run a registration payload through the validator offline
//! - `export` — dump the team list as CSV or JSON

pub mod export;
pub mod setup_admin;
pub mod validate;

/// Resolve the database URL from a flag or `DATABASE_URL`.
pub fn resolve_database_url(flag: Option<String>) -> anyhow::Result<String> {
    flag.or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow::anyhow!("no database configured; pass --database-url or set DATABASE_URL"))
}
