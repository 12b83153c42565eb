//! `sports_participation` table operations.
//!
//! Rows are reconciled by diff when a team's sports change: inserts for new
//! sports, targeted deletes for dropped ones. The table is never rewritten
//! wholesale, so rows for unchanged sports keep their status and timestamps.

use chrono::{DateTime, Utc};
use fest_core::Sport;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::{ParticipationRecord, ParticipationStatus};

#[derive(Debug, sqlx::FromRow)]
struct ParticipationRow {
    id: Uuid,
    team_id: Uuid,
    team_name: String,
    sport: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl ParticipationRow {
    fn into_record(self) -> Option<ParticipationRecord> {
        let Some(sport) = Sport::parse(&self.sport) else {
            tracing::warn!(row_id = %self.id, sport = %self.sport, "unknown sport in participation row, skipping");
            return None;
        };
        let status = ParticipationStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::warn!(row_id = %self.id, status = %self.status, "unknown status in participation row, defaulting to registered");
            ParticipationStatus::Registered
        });
        Some(ParticipationRecord {
            id: self.id,
            team_id: self.team_id,
            team_name: self.team_name,
            sport,
            status,
            created_at: self.created_at,
        })
    }
}

/// Insert or replace one participation row.
pub async fn upsert(pool: &PgPool, row: &ParticipationRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sports_participation (id, team_id, team_name, sport, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (team_id, sport) DO UPDATE SET
            team_name = EXCLUDED.team_name,
            status = EXCLUDED.status
        "#,
    )
    .bind(row.id)
    .bind(row.team_id)
    .bind(&row.team_name)
    .bind(row.sport.as_str())
    .bind(row.status.as_str())
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove the row for one team-sport pair.
pub async fn delete_pair(pool: &PgPool, team_id: Uuid, sport: Sport) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sports_participation WHERE team_id = $1 AND sport = $2")
        .bind(team_id)
        .bind(sport.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove every row belonging to a team.
pub async fn delete_by_team(pool: &PgPool, team_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sports_participation WHERE team_id = $1")
        .bind(team_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<ParticipationRecord>, sqlx::Error> {
    let rows: Vec<ParticipationRow> = sqlx::query_as("SELECT * FROM sports_participation")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(ParticipationRow::into_record)
        .collect())
}
