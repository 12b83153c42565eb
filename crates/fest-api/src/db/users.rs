//! `users` table operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Role;
use crate::state::UserRecord;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    is_active: bool,
    permissions: sqlx::types::Json<Vec<String>>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        let role = Role::parse(&self.role).unwrap_or_else(|| {
            tracing::warn!(user_id = %self.id, role = %self.role, "unknown role in users row, defaulting to team");
            Role::Team
        });
        UserRecord {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            role,
            password_hash: self.password_hash,
            created_at: self.created_at,
            last_login: self.last_login,
            is_active: self.is_active,
            permissions: self.permissions.0,
        }
    }
}

/// Insert or replace an account row.
pub async fn upsert(pool: &PgPool, user: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, display_name, role, password_hash, created_at, last_login, is_active, permissions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            email = EXCLUDED.email,
            display_name = EXCLUDED.display_name,
            role = EXCLUDED.role,
            password_hash = EXCLUDED.password_hash,
            last_login = EXCLUDED.last_login,
            is_active = EXCLUDED.is_active,
            permissions = EXCLUDED.permissions
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(user.role.as_str())
    .bind(&user.password_hash)
    .bind(user.created_at)
    .bind(user.last_login)
    .bind(user.is_active)
    .bind(sqlx::types::Json(&user.permissions))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users").fetch_all(pool).await?;
    Ok(rows.into_iter().map(UserRow::into_record).collect())
}
