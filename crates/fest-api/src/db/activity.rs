//! `activity` table operations. Append-only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::{ActivityKind, ActivityRecord, ActivityScope};

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    scope: String,
    kind: String,
    description: String,
    team_id: Option<Uuid>,
    ts: DateTime<Utc>,
}

impl ActivityRow {
    fn into_record(self) -> Option<ActivityRecord> {
        let Some(scope) = ActivityScope::parse(&self.scope) else {
            tracing::warn!(entry_id = %self.id, scope = %self.scope, "unknown scope in activity row, skipping");
            return None;
        };
        let Some(kind) = ActivityKind::parse(&self.kind) else {
            tracing::warn!(entry_id = %self.id, kind = %self.kind, "unknown kind in activity row, skipping");
            return None;
        };
        Some(ActivityRecord {
            id: self.id,
            scope,
            kind,
            description: self.description,
            team_id: self.team_id,
            timestamp: self.ts,
        })
    }
}

pub async fn insert(pool: &PgPool, entry: &ActivityRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO activity (id, scope, kind, description, team_id, ts) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.id)
    .bind(entry.scope.as_str())
    .bind(entry.kind.as_str())
    .bind(&entry.description)
    .bind(entry.team_id)
    .bind(entry.timestamp)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<ActivityRecord>, sqlx::Error> {
    let rows: Vec<ActivityRow> = sqlx::query_as("SELECT * FROM activity").fetch_all(pool).await?;
    Ok(rows.into_iter().filter_map(ActivityRow::into_record).collect())
}
