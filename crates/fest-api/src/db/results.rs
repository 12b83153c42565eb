//! `results` table operations.

use chrono::{DateTime, Utc};
use fest_core::Sport;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::{ResultRecord, ResultStatus};

#[derive(Debug, sqlx::FromRow)]
struct ResultRow {
    id: Uuid,
    team_id: Uuid,
    team_name: String,
    sport: String,
    score: String,
    position: Option<i32>,
    date: DateTime<Utc>,
    status: String,
    notes: Option<String>,
}

impl ResultRow {
    fn into_record(self) -> Option<ResultRecord> {
        let Some(sport) = Sport::parse(&self.sport) else {
            tracing::warn!(result_id = %self.id, sport = %self.sport, "unknown sport in results row, skipping");
            return None;
        };
        let status = ResultStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::warn!(result_id = %self.id, status = %self.status, "unknown status in results row, defaulting to provisional");
            ResultStatus::Provisional
        });
        Some(ResultRecord {
            id: self.id,
            team_id: self.team_id,
            team_name: self.team_name,
            sport,
            score: self.score,
            position: self.position.and_then(|p| u32::try_from(p).ok()),
            date: self.date,
            status,
            notes: self.notes,
        })
    }
}

/// Insert or replace a result row.
pub async fn upsert(pool: &PgPool, result: &ResultRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO results (id, team_id, team_name, sport, score, position, date, status, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            team_id = EXCLUDED.team_id,
            team_name = EXCLUDED.team_name,
            sport = EXCLUDED.sport,
            score = EXCLUDED.score,
            position = EXCLUDED.position,
            date = EXCLUDED.date,
            status = EXCLUDED.status,
            notes = EXCLUDED.notes
        "#,
    )
    .bind(result.id)
    .bind(result.team_id)
    .bind(&result.team_name)
    .bind(result.sport.as_str())
    .bind(&result.score)
    .bind(result.position.map(|p| p as i32))
    .bind(result.date)
    .bind(result.status.as_str())
    .bind(&result.notes)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM results WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove every result belonging to a team.
pub async fn delete_by_team(pool: &PgPool, team_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM results WHERE team_id = $1")
        .bind(team_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<ResultRecord>, sqlx::Error> {
    let rows: Vec<ResultRow> = sqlx::query_as("SELECT * FROM results").fetch_all(pool).await?;
    Ok(rows.into_iter().filter_map(ResultRow::into_record).collect())
}
