//! # Events API
//!
//! Admin-managed event schedule. Teams can read the schedule; only admins
//! may create, edit, or delete events.
//!
//! ## Endpoints
//!
//! - `POST /v1/events` — create event (admin)
//! - `GET /v1/events` — list events
//! - `GET /v1/events/:id` — get event
//! - `PUT /v1/events/:id` — update event (admin)
//! - `DELETE /v1/events/:id` — delete event (admin)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fest_core::Sport;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{
    ActivityKind, ActivityScope, AppState, ChangeOp, Collection, EventRecord, EventStatus,
    DEFAULT_MAX_TEAMS,
};

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to schedule a new event.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub sport: Sport,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub venue: String,
    #[serde(default)]
    pub description: String,
    pub max_teams: Option<u32>,
    pub status: Option<EventStatus>,
}

impl Validate for CreateEventRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        if self.venue.trim().is_empty() {
            errors.push("venue must not be empty".to_string());
        }
        if self.end_date < self.start_date {
            errors.push("end date must not precede start date".to_string());
        }
        if self.max_teams == Some(0) {
            errors.push("max teams must be at least 1".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Event edit request. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub sport: Option<Sport>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub max_teams: Option<u32>,
    pub status: Option<EventStatus>,
    pub participating_teams: Option<Vec<Uuid>>,
}

impl Validate for UpdateEventRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push("name must not be empty if provided".to_string());
            }
        }
        if let Some(venue) = &self.venue {
            if venue.trim().is_empty() {
                errors.push("venue must not be empty if provided".to_string());
            }
        }
        if self.max_teams == Some(0) {
            errors.push("max teams must be at least 1".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Event list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EventListQuery {
    pub status: Option<String>,
    pub sport: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(list_events).post(create_event))
        .route(
            "/v1/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/events — Schedule an event.
#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventRecord),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 422, description = "Validation errors", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
async fn create_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRecord>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;

    let event = EventRecord {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        sport: req.sport,
        start_date: req.start_date,
        end_date: req.end_date,
        venue: req.venue.trim().to_string(),
        description: req.description,
        max_teams: req.max_teams.unwrap_or(DEFAULT_MAX_TEAMS),
        status: req.status.unwrap_or(EventStatus::Upcoming),
        participating_teams: Vec::new(),
    };

    state.events.insert(event.id, event.clone());
    state.notify(Collection::Events, event.id, ChangeOp::Created);
    if let Some(pool) = &state.pool {
        crate::db::events::upsert(pool, &event).await?;
    }

    state
        .record_activity(
            ActivityScope::Admin,
            ActivityKind::EventCreated,
            format!("New event created: {}", event.name),
            None,
        )
        .await;

    tracing::info!(event_id = %event.id, name = %event.name, sport = %event.sport, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /v1/events — List events, soonest first.
#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events matching the filters", body = Vec<EventRecord>),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
async fn list_events(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventRecord>>, AppError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            EventStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter: {raw}")))?,
        ),
    };
    let sport = match query.sport.as_deref() {
        None => None,
        Some(raw) => Some(
            Sport::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown sport filter: {raw}")))?,
        ),
    };

    let mut events: Vec<EventRecord> = state
        .events
        .list()
        .into_iter()
        .filter(|e| status.map_or(true, |s| e.status == s))
        .filter(|e| sport.map_or(true, |s| e.sport == s))
        .collect();
    events.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    Ok(Json(events))
}

/// GET /v1/events/:id — Fetch one event.
#[utoipa::path(
    get,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = EventRecord),
        (status = 404, description = "Event not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
async fn get_event(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<EventRecord>, AppError> {
    state
        .events
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))
}

/// PUT /v1/events/:id — Edit an event.
///
/// `participating_teams` must reference registered teams and fit within
/// `max_teams`; the check and the write happen under one store lock.
#[utoipa::path(
    put,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventRecord),
        (status = 404, description = "Event not found", body = crate::error::ErrorBody),
        (status = 409, description = "Too many participating teams", body = crate::error::ErrorBody),
        (status = 422, description = "Validation errors", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
async fn update_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<EventRecord>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;

    if let Some(team_ids) = &req.participating_teams {
        for team_id in team_ids {
            if !state.teams.contains(team_id) {
                return Err(AppError::Validation(format!(
                    "unknown participating team: {team_id}"
                )));
            }
        }
    }

    let outcome = state.events.try_update(&id, |event| {
        if let Some(teams) = &req.participating_teams {
            let cap = req.max_teams.unwrap_or(event.max_teams);
            if teams.len() as u32 > cap {
                return Err(AppError::Conflict(format!(
                    "event allows at most {cap} teams"
                )));
            }
            event.participating_teams = teams.clone();
        }
        if let Some(name) = &req.name {
            event.name = name.trim().to_string();
        }
        if let Some(sport) = req.sport {
            event.sport = sport;
        }
        if let Some(start) = req.start_date {
            event.start_date = start;
        }
        if let Some(end) = req.end_date {
            event.end_date = end;
        }
        if let Some(venue) = &req.venue {
            event.venue = venue.trim().to_string();
        }
        if let Some(description) = &req.description {
            event.description = description.clone();
        }
        if let Some(max_teams) = req.max_teams {
            event.max_teams = max_teams;
        }
        if let Some(status) = req.status {
            event.status = status;
        }
        Ok(event.clone())
    });

    let updated = match outcome {
        Some(Ok(event)) => event,
        Some(Err(err)) => return Err(err),
        None => return Err(AppError::NotFound(format!("event {id} not found"))),
    };
    state.notify(Collection::Events, id, ChangeOp::Updated);
    if let Some(pool) = &state.pool {
        crate::db::events::upsert(pool, &updated).await?;
    }

    tracing::info!(event_id = %id, "event updated");
    Ok(Json(updated))
}

/// DELETE /v1/events/:id — Delete an event.
#[utoipa::path(
    delete,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Event not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
async fn delete_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;

    let event = state
        .events
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))?;
    state.notify(Collection::Events, id, ChangeOp::Deleted);
    if let Some(pool) = &state.pool {
        crate::db::events::delete(pool, id).await?;
    }

    state
        .record_activity(
            ActivityScope::Admin,
            ActivityKind::EventDeleted,
            format!("Event deleted: {}", event.name),
            None,
        )
        .await;

    tracing::info!(event_id = %id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
