//! # Setup-Admin Subcommand
//!
//! Seeds the admin account directly in Postgres. Safe to run repeatedly:
//! an existing account is left untouched unless `--force` is given, so the
//! command can sit in a deploy script.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use uuid::Uuid;

use fest_api::auth::Role;
use fest_api::password::hash_password;
use fest_api::state::UserRecord;

/// Arguments for the `fest setup-admin` subcommand.
#[derive(Args, Debug)]
pub struct SetupAdminArgs {
    /// Admin account email.
    #[arg(long, default_value = "admin@fest.pk")]
    pub email: String,

    /// Admin account password. Read from FEST_ADMIN_PASSWORD when omitted.
    #[arg(long)]
    pub password: Option<String>,

    /// Display name for the account.
    #[arg(long, default_value = "Portal Admin")]
    pub display_name: String,

    /// Overwrite the password of an existing account.
    #[arg(long)]
    pub force: bool,

    /// Postgres connection string. Defaults to DATABASE_URL.
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Execute the setup-admin subcommand.
///
/// Returns exit code: 0 on success, 2 on operational error.
pub async fn run_setup_admin(args: SetupAdminArgs) -> Result<u8> {
    let password = match args.password {
        Some(p) => p,
        None => std::env::var("FEST_ADMIN_PASSWORD")
            .context("no password given; pass --password or set FEST_ADMIN_PASSWORD")?,
    };

    let url = crate::resolve_database_url(args.database_url)?;
    let pool = fest_api::db::init_pool(&url).await?;

    let existing = fest_api::db::users::load_all(&pool)
        .await?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(&args.email));

    match existing {
        Some(user) if !args.force => {
            println!("admin account {} already exists (id {})", user.email, user.id);
            Ok(0)
        }
        Some(mut user) => {
            user.password_hash = hash_password(&password)?;
            user.role = Role::Admin;
            user.is_active = true;
            fest_api::db::users::upsert(&pool, &user).await?;
            println!("admin account {} reset (id {})", user.email, user.id);
            Ok(0)
        }
        None => {
            let user = UserRecord {
                id: Uuid::new_v4(),
                email: args.email.trim().to_lowercase(),
                display_name: args.display_name,
                role: Role::Admin,
                password_hash: hash_password(&password)?,
                created_at: Utc::now(),
                last_login: None,
                is_active: true,
                permissions: vec![
                    "read".to_string(),
                    "write".to_string(),
                    "delete".to_string(),
                    "admin".to_string(),
                ],
            };
            fest_api::db::users::upsert(&pool, &user).await?;
            println!("admin account {} created (id {})", user.email, user.id);
            Ok(0)
        }
    }
}
