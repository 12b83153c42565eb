//! # Teams API
//!
//! Team listing/filtering for the admin console, self-service team edits
//! with participation reconciliation, status decisions, and deletion.
//!
//! ## Endpoints
//!
//! - `GET /v1/teams` — list teams with filters (admin)
//! - `GET /v1/teams/:id` — get a team (admin or owner)
//! - `PUT /v1/teams/:id` — edit a team (admin or owner)
//! - `PATCH /v1/teams/:id/status` — decide a team (admin)
//! - `DELETE /v1/teams/:id` — delete a team (admin)
//! - `GET /v1/teams/:id/results` — the team's results (admin or owner)
//! - `GET /v1/teams/:id/activity` — the team's activity feed (admin or owner)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use fest_core::team::{Captain, Member, TeamCategory, TeamStatus};
use fest_core::validate::{
    is_valid_cnic, is_valid_email, normalize_phone, team_sports, validate_members, CaptainForm,
    MemberForm, RegistrationError,
};
use fest_core::Sport;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{
    ActivityKind, ActivityRecord, ActivityScope, AppState, ChangeOp, Collection, ResultRecord,
    TeamRecord,
};

// ── Request DTOs ────────────────────────────────────────────────────

/// Team list filters. All optional and combined with AND; `q` is a
/// case-insensitive substring match over name, institution, and captain.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TeamListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub sport: Option<String>,
    pub q: Option<String>,
}

/// Team edit request. Omitted fields are left unchanged. Member and sport
/// edits run through the same rules as registration.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub team_name: Option<String>,
    pub institution: Option<String>,
    pub city: Option<String>,
    pub captain: Option<CaptainForm>,
    pub members: Option<Vec<MemberForm>>,
    pub sports: Option<Vec<Sport>>,
}

/// Status decision body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTeamStatusRequest {
    pub status: TeamStatus,
}

/// Feed limit parameter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/teams", get(list_teams))
        .route(
            "/v1/teams/:id",
            get(get_team).put(update_team).delete(delete_team),
        )
        .route("/v1/teams/:id/status", axum::routing::patch(update_team_status))
        .route("/v1/teams/:id/results", get(team_results))
        .route("/v1/teams/:id/activity", get(team_activity))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/teams — List teams, newest first.
#[utoipa::path(
    get,
    path = "/v1/teams",
    params(TeamListQuery),
    responses(
        (status = 200, description = "Teams matching the filters", body = Vec<TeamRecord>),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn list_teams(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<TeamListQuery>,
) -> Result<Json<Vec<TeamRecord>>, AppError> {
    require_role(&caller, Role::Admin)?;

    let status = parse_filter(query.status.as_deref(), TeamStatus::parse, "status")?;
    let category = parse_filter(query.category.as_deref(), TeamCategory::parse, "category")?;
    let sport = parse_filter(query.sport.as_deref(), Sport::parse, "sport")?;
    let needle = query.q.as_deref().map(str::to_lowercase);

    let mut teams: Vec<TeamRecord> = state
        .teams
        .list()
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .filter(|t| category.map_or(true, |c| t.category == c))
        .filter(|t| {
            query
                .city
                .as_deref()
                .map_or(true, |city| t.city.eq_ignore_ascii_case(city))
        })
        .filter(|t| sport.map_or(true, |s| t.sports.contains(&s)))
        .filter(|t| {
            needle.as_deref().map_or(true, |q| {
                t.team_name.to_lowercase().contains(q)
                    || t.institution.to_lowercase().contains(q)
                    || t.captain.name.to_lowercase().contains(q)
            })
        })
        .collect();
    teams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(teams))
}

/// GET /v1/teams/:id — Fetch one team.
#[utoipa::path(
    get,
    path = "/v1/teams/{id}",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team found", body = TeamRecord),
        (status = 404, description = "Team not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn get_team(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamRecord>, AppError> {
    authorize_team_access(&caller, id)?;
    state
        .teams
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("team {id} not found")))
}

/// PUT /v1/teams/:id — Edit a team.
///
/// Member and sport edits are re-validated with the registration rules and
/// the participation rows are reconciled by diff: rows are added for new
/// sports and removed for dropped ones, while rows for unchanged sports are
/// left untouched.
#[utoipa::path(
    put,
    path = "/v1/teams/{id}",
    params(("id" = Uuid, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamRecord),
        (status = 404, description = "Team not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation errors", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn update_team(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTeamRequest>, JsonRejection>,
) -> Result<Json<TeamRecord>, AppError> {
    authorize_team_access(&caller, id)?;
    let req = extract_json(body)?;

    let existing = state
        .teams
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("team {id} not found")))?;

    let mut errors: Vec<RegistrationError> = Vec::new();

    let captain = match &req.captain {
        Some(form) => validate_captain(form, &mut errors),
        None => Some(existing.captain.clone()),
    };

    let members = match &req.members {
        Some(rows) => rows
            .iter()
            .map(|row| Member {
                id: row.id.unwrap_or_else(Uuid::new_v4),
                name: row.name.trim().to_string(),
                phone: normalize_phone(&row.phone).unwrap_or_else(|| row.phone.clone()),
                cnic: row.cnic.trim().to_string(),
                sports: row.sports.clone(),
            })
            .collect(),
        None => existing.members.clone(),
    };
    errors.extend(validate_members(existing.category, &members));

    let selected = req.sports.clone().unwrap_or_else(|| existing.sports.clone());
    let new_sports = team_sports(&selected, &members);
    if new_sports.is_empty() {
        errors.push(RegistrationError::NoSportsSelected);
    }

    if !errors.is_empty() {
        return Err(errors.into());
    }
    let captain = captain.expect("captain errors already reported");

    let now = Utc::now();
    let updated = state
        .teams
        .update(&id, |team| {
            if let Some(name) = &req.team_name {
                team.team_name = name.trim().to_string();
            }
            if let Some(institution) = &req.institution {
                team.institution = institution.trim().to_string();
            }
            if let Some(city) = &req.city {
                team.city = city.trim().to_string();
            }
            team.captain = captain.clone();
            team.members = members.clone();
            team.sports = new_sports.clone();
            team.updated_at = now;
        })
        .ok_or_else(|| AppError::NotFound(format!("team {id} not found")))?;
    state.notify(Collection::Teams, id, ChangeOp::Updated);

    // One write lock over the participation store; the diff is taken
    // against the rows actually present, so a replayed edit cannot insert
    // a second row for the same team-sport pair.
    let sync = state.reconcile_participation(id, &updated.team_name, &updated.sports, now);
    for row in &sync.added {
        state.notify(Collection::SportsParticipation, row.id, ChangeOp::Created);
        if let Some(pool) = &state.pool {
            crate::db::participation::upsert(pool, row).await?;
        }
    }
    for row in &sync.removed {
        state.notify(Collection::SportsParticipation, row.id, ChangeOp::Deleted);
        if let Some(pool) = &state.pool {
            crate::db::participation::delete_pair(pool, id, row.sport).await?;
        }
    }

    if let Some(pool) = &state.pool {
        crate::db::teams::upsert(pool, &updated).await?;
    }

    if !sync.added.is_empty() {
        let names: Vec<&str> = sync.added.iter().map(|r| r.sport.label()).collect();
        state
            .record_activity(
                ActivityScope::Team,
                ActivityKind::SportAdded,
                format!("Added sports: {}", names.join(", ")),
                Some(id),
            )
            .await;
    }

    tracing::info!(team_id = %id, added = sync.added.len(), removed = sync.removed.len(), "team updated");
    Ok(Json(updated))
}

/// PATCH /v1/teams/:id/status — Approve/reject/disqualify a team.
#[utoipa::path(
    patch,
    path = "/v1/teams/{id}/status",
    params(("id" = Uuid, Path, description = "Team ID")),
    request_body = UpdateTeamStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TeamRecord),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Team not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn update_team_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTeamStatusRequest>, JsonRejection>,
) -> Result<Json<TeamRecord>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;

    let updated = state
        .teams
        .update(&id, |team| {
            team.status = req.status;
            team.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("team {id} not found")))?;
    state.notify(Collection::Teams, id, ChangeOp::Updated);
    if let Some(pool) = &state.pool {
        crate::db::teams::upsert(pool, &updated).await?;
    }

    tracing::info!(team_id = %id, status = %req.status, "team status updated");
    Ok(Json(updated))
}

/// DELETE /v1/teams/:id — Delete a team.
///
/// Cascades to the team's participation and result rows and the owning
/// account; sessions for the account are revoked.
#[utoipa::path(
    delete,
    path = "/v1/teams/{id}",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Team not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn delete_team(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;

    let team = state
        .teams
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("team {id} not found")))?;
    state.notify(Collection::Teams, id, ChangeOp::Deleted);

    let removed = state.participation.remove_where(|row| row.team_id == id);
    for row in &removed {
        state.notify(Collection::SportsParticipation, row.id, ChangeOp::Deleted);
    }
    let removed_results = state.results.remove_where(|row| row.team_id == id);
    for row in &removed_results {
        state.notify(Collection::Results, row.id, ChangeOp::Deleted);
    }

    // The team id is the owning user's id; the account goes with the team,
    // and any live sessions for it stop authenticating.
    if state.users.remove(&id).is_some() {
        state.notify(Collection::Users, id, ChangeOp::Deleted);
    }
    state.sessions.remove_where(|session| session.user_id == id);

    if let Some(pool) = &state.pool {
        crate::db::teams::delete(pool, id).await?;
        crate::db::participation::delete_by_team(pool, id).await?;
        crate::db::results::delete_by_team(pool, id).await?;
        crate::db::users::delete(pool, id).await?;
    }

    state
        .record_activity(
            ActivityScope::Admin,
            ActivityKind::TeamDeleted,
            format!("Team deleted: {}", team.team_name),
            Some(id),
        )
        .await;

    tracing::info!(
        team_id = %id,
        participation_rows = removed.len(),
        result_rows = removed_results.len(),
        "team deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/teams/:id/results — The team's results, newest first.
#[utoipa::path(
    get,
    path = "/v1/teams/{id}/results",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Results for the team", body = Vec<ResultRecord>),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn team_results(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ResultRecord>>, AppError> {
    authorize_team_access(&caller, id)?;
    let mut results: Vec<ResultRecord> = state
        .results
        .list()
        .into_iter()
        .filter(|r| r.team_id == id)
        .collect();
    results.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(results))
}

/// GET /v1/teams/:id/activity — The team's activity feed, newest first.
#[utoipa::path(
    get,
    path = "/v1/teams/{id}/activity",
    params(("id" = Uuid, Path, description = "Team ID"), FeedQuery),
    responses(
        (status = 200, description = "Activity entries", body = Vec<ActivityRecord>),
    ),
    security(("bearer" = [])),
    tag = "teams"
)]
async fn team_activity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<ActivityRecord>>, AppError> {
    authorize_team_access(&caller, id)?;
    let limit = query.limit.unwrap_or(10);
    let mut entries: Vec<ActivityRecord> = state
        .activity
        .list()
        .into_iter()
        .filter(|a| a.scope == ActivityScope::Team && a.team_id == Some(id))
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    Ok(Json(entries))
}

// ── Helpers ─────────────────────────────────────────────────────────

fn authorize_team_access(caller: &CallerIdentity, team_id: Uuid) -> Result<(), AppError> {
    if caller.can_access_team(team_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you may only access your own team".to_string(),
        ))
    }
}

fn parse_filter<T: Copy>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match raw {
        None => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("unknown {name} filter: {value}"))),
    }
}

fn validate_captain(form: &CaptainForm, errors: &mut Vec<RegistrationError>) -> Option<Captain> {
    let mut ok = true;
    if form.name.trim().is_empty() {
        errors.push(RegistrationError::MissingField("Captain name"));
        ok = false;
    }
    if !is_valid_email(form.email.trim()) {
        errors.push(RegistrationError::InvalidEmail);
        ok = false;
    }
    let phone = match normalize_phone(&form.phone) {
        Some(phone) => phone,
        None => {
            errors.push(RegistrationError::InvalidPhone("Captain".to_string()));
            ok = false;
            String::new()
        }
    };
    if !is_valid_cnic(form.cnic.trim()) {
        errors.push(RegistrationError::InvalidCnic("Captain".to_string()));
        ok = false;
    }
    ok.then(|| Captain {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone,
        cnic: form.cnic.trim().to_string(),
    })
}
