//! `events` table operations.

use chrono::{DateTime, Utc};
use fest_core::Sport;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::{EventRecord, EventStatus};

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    sport: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    venue: String,
    description: String,
    max_teams: i32,
    status: String,
    participating_teams: sqlx::types::Json<Vec<Uuid>>,
}

impl EventRow {
    /// Rows whose sport no longer parses are dropped from hydration.
    fn into_record(self) -> Option<EventRecord> {
        let Some(sport) = Sport::parse(&self.sport) else {
            tracing::warn!(event_id = %self.id, sport = %self.sport, "unknown sport in events row, skipping");
            return None;
        };
        let status = EventStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::warn!(event_id = %self.id, status = %self.status, "unknown status in events row, defaulting to upcoming");
            EventStatus::Upcoming
        });
        Some(EventRecord {
            id: self.id,
            name: self.name,
            sport,
            start_date: self.start_date,
            end_date: self.end_date,
            venue: self.venue,
            description: self.description,
            max_teams: self.max_teams.max(0) as u32,
            status,
            participating_teams: self.participating_teams.0,
        })
    }
}

/// Insert or replace an event row.
pub async fn upsert(pool: &PgPool, event: &EventRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO events (id, name, sport, start_date, end_date, venue, description, max_teams, status, participating_teams)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            sport = EXCLUDED.sport,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            venue = EXCLUDED.venue,
            description = EXCLUDED.description,
            max_teams = EXCLUDED.max_teams,
            status = EXCLUDED.status,
            participating_teams = EXCLUDED.participating_teams
        "#,
    )
    .bind(event.id)
    .bind(&event.name)
    .bind(event.sport.as_str())
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(&event.venue)
    .bind(&event.description)
    .bind(event.max_teams as i32)
    .bind(event.status.as_str())
    .bind(sqlx::types::Json(&event.participating_teams))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<EventRecord>, sqlx::Error> {
    let rows: Vec<EventRow> = sqlx::query_as("SELECT * FROM events").fetch_all(pool).await?;
    Ok(rows.into_iter().filter_map(EventRow::into_record).collect())
}
