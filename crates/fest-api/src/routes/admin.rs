//! # Admin Console API
//!
//! Portal statistics and team-list exports.
//!
//! ## Endpoints
//!
//! - `GET /v1/admin/stats` — portal statistics
//! - `GET /v1/admin/export/teams.csv` — CSV export
//! - `GET /v1/admin/export/teams.json` — JSON export

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fest_core::export::{teams_to_csv, TeamSummary};
use fest_core::team::TeamStatus;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::state::{AppState, EventRecord, TeamRecord};

// ── Response DTOs ───────────────────────────────────────────────────

/// Per-sport registration count.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SportStat {
    pub sport: String,
    pub team_count: u64,
}

/// Portal statistics for the admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_teams: u64,
    /// Headcount across all teams, captains included.
    pub total_participants: u64,
    pub pending_teams: u64,
    pub approved_teams: u64,
    pub total_events: u64,
    #[schema(value_type = Object)]
    pub events_by_status: BTreeMap<String, u64>,
    #[schema(value_type = Object)]
    pub teams_by_category: BTreeMap<String, u64>,
    #[schema(value_type = Object)]
    pub teams_by_city: BTreeMap<String, u64>,
    pub sports_overview: Vec<SportStat>,
}

/// JSON export envelope.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamsExport {
    pub teams: Vec<TeamRecord>,
    pub events: Vec<EventRecord>,
    pub timestamp: DateTime<Utc>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/stats", get(stats))
        .route("/v1/admin/export/teams.csv", get(export_teams_csv))
        .route("/v1/admin/export/teams.json", get(export_teams_json))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/admin/stats — Compute portal statistics from the stores.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    responses(
        (status = 200, description = "Portal statistics", body = StatsResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
async fn stats(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<StatsResponse>, AppError> {
    require_role(&caller, Role::Admin)?;

    let teams = state.teams.list();
    let events = state.events.list();

    let mut events_by_status: BTreeMap<String, u64> = BTreeMap::new();
    for event in &events {
        *events_by_status
            .entry(event.status.as_str().to_string())
            .or_default() += 1;
    }

    let mut teams_by_category: BTreeMap<String, u64> = BTreeMap::new();
    let mut teams_by_city: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_sport: BTreeMap<&'static str, u64> = BTreeMap::new();
    let mut total_participants: u64 = 0;
    for team in &teams {
        *teams_by_category
            .entry(team.category.as_str().to_string())
            .or_default() += 1;
        *teams_by_city.entry(team.city.clone()).or_default() += 1;
        for sport in &team.sports {
            *by_sport.entry(sport.as_str()).or_default() += 1;
        }
        total_participants += team.participant_count() as u64;
    }

    let sports_overview = by_sport
        .into_iter()
        .map(|(sport, team_count)| SportStat {
            sport: sport.to_string(),
            team_count,
        })
        .collect();

    Ok(Json(StatsResponse {
        total_teams: teams.len() as u64,
        total_participants,
        pending_teams: teams
            .iter()
            .filter(|t| t.status == TeamStatus::Pending)
            .count() as u64,
        approved_teams: teams
            .iter()
            .filter(|t| t.status == TeamStatus::Approved)
            .count() as u64,
        total_events: events.len() as u64,
        events_by_status,
        teams_by_category,
        teams_by_city,
        sports_overview,
    }))
}

/// GET /v1/admin/export/teams.csv — Download the team list as CSV.
#[utoipa::path(
    get,
    path = "/v1/admin/export/teams.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
async fn export_teams_csv(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, AppError> {
    require_role(&caller, Role::Admin)?;

    let mut teams = state.teams.list();
    teams.sort_by(|a, b| a.team_name.cmp(&b.team_name));
    let summaries: Vec<TeamSummary> = teams.iter().map(TeamRecord::summary).collect();
    let csv = teams_to_csv(&summaries);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"teams.csv\"",
            ),
        ],
        csv,
    ))
}

/// GET /v1/admin/export/teams.json — Download teams and events as JSON.
#[utoipa::path(
    get,
    path = "/v1/admin/export/teams.json",
    responses(
        (status = 200, description = "JSON export", body = TeamsExport),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
async fn export_teams_json(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<TeamsExport>, AppError> {
    require_role(&caller, Role::Admin)?;

    let mut teams = state.teams.list();
    teams.sort_by(|a, b| a.team_name.cmp(&b.team_name));
    let mut events = state.events.list();
    events.sort_by(|a, b| a.start_date.cmp(&b.start_date));

    Ok(Json(TeamsExport {
        teams,
        events,
        timestamp: Utc::now(),
    }))
}
