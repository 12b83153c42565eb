//! # Database Layer
//!
//! Optional Postgres mirror of the in-memory stores. Each collection has a
//! module with a `FromRow` row struct, upsert/delete operations, and a
//! `load_all` used to hydrate the stores at startup. Unknown status strings
//! in stored rows are logged and defaulted rather than failing hydration.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod activity;
pub mod events;
pub mod participation;
pub mod results;
pub mod teams;
pub mod users;

/// Open a pool and run embedded migrations.
pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database pool ready, migrations applied");
    Ok(pool)
}
