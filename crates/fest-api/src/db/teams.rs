//! `teams` table operations.

use chrono::{DateTime, Utc};
use fest_core::team::{Captain, Member, TeamCategory, TeamStatus};
use fest_core::Sport;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::TeamRecord;

#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    team_name: String,
    institution: String,
    city: String,
    category: String,
    captain: sqlx::types::Json<Captain>,
    members: sqlx::types::Json<Vec<Member>>,
    sports: sqlx::types::Json<Vec<Sport>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TeamRow {
    fn into_record(self) -> TeamRecord {
        let category = TeamCategory::parse(&self.category).unwrap_or_else(|| {
            tracing::warn!(team_id = %self.id, category = %self.category, "unknown category in teams row, defaulting to amateur");
            TeamCategory::Amateur
        });
        let status = TeamStatus::parse(&self.status).unwrap_or_else(|| {
            tracing::warn!(team_id = %self.id, status = %self.status, "unknown status in teams row, defaulting to pending");
            TeamStatus::Pending
        });
        TeamRecord {
            id: self.id,
            team_name: self.team_name,
            institution: self.institution,
            city: self.city,
            category,
            captain: self.captain.0,
            members: self.members.0,
            sports: self.sports.0,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert or replace a team row.
pub async fn upsert(pool: &PgPool, team: &TeamRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO teams (id, team_name, institution, city, category, captain, members, sports, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            team_name = EXCLUDED.team_name,
            institution = EXCLUDED.institution,
            city = EXCLUDED.city,
            category = EXCLUDED.category,
            captain = EXCLUDED.captain,
            members = EXCLUDED.members,
            sports = EXCLUDED.sports,
            status = EXCLUDED.status,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(team.id)
    .bind(&team.team_name)
    .bind(&team.institution)
    .bind(&team.city)
    .bind(team.category.as_str())
    .bind(sqlx::types::Json(&team.captain))
    .bind(sqlx::types::Json(&team.members))
    .bind(sqlx::types::Json(&team.sports))
    .bind(team.status.as_str())
    .bind(team.created_at)
    .bind(team.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<TeamRecord>, sqlx::Error> {
    let rows: Vec<TeamRow> = sqlx::query_as("SELECT * FROM teams").fetch_all(pool).await?;
    Ok(rows.into_iter().map(TeamRow::into_record).collect())
}
