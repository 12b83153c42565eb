//! # Sports Participation API
//!
//! Read access to the per-team-per-sport rows and admin status updates.
//! Row creation and removal happen only through registration and team
//! edits, which reconcile the rows by diff.
//!
//! ## Endpoints
//!
//! - `GET /v1/participation` — list rows (admin all, team own)
//! - `PATCH /v1/participation/:id/status` — update a row's status (admin)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use fest_core::Sport;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{AppState, ChangeOp, Collection, ParticipationRecord, ParticipationStatus};

// ── Request DTOs ────────────────────────────────────────────────────

/// Participation list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ParticipationListQuery {
    pub team_id: Option<Uuid>,
    pub sport: Option<String>,
    pub status: Option<String>,
}

/// Status update body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateParticipationStatusRequest {
    pub status: ParticipationStatus,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/participation", get(list_participation))
        .route(
            "/v1/participation/:id/status",
            patch(update_participation_status),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/participation — List participation rows. Team callers see only
/// their own rows regardless of filters.
#[utoipa::path(
    get,
    path = "/v1/participation",
    params(ParticipationListQuery),
    responses(
        (status = 200, description = "Rows matching the filters", body = Vec<ParticipationRecord>),
    ),
    security(("bearer" = [])),
    tag = "participation"
)]
async fn list_participation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ParticipationListQuery>,
) -> Result<Json<Vec<ParticipationRecord>>, AppError> {
    let sport = match query.sport.as_deref() {
        None => None,
        Some(raw) => Some(
            Sport::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown sport filter: {raw}")))?,
        ),
    };
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            ParticipationStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter: {raw}")))?,
        ),
    };

    let mut rows: Vec<ParticipationRecord> = state
        .participation
        .list()
        .into_iter()
        .filter(|row| {
            if caller.is_admin() {
                query.team_id.map_or(true, |id| row.team_id == id)
            } else {
                caller.user_id == Some(row.team_id)
            }
        })
        .filter(|row| sport.map_or(true, |s| row.sport == s))
        .filter(|row| status.map_or(true, |s| row.status == s))
        .collect();
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(rows))
}

/// PATCH /v1/participation/:id/status — Move a row through
/// registered → active → completed.
#[utoipa::path(
    patch,
    path = "/v1/participation/{id}/status",
    params(("id" = Uuid, Path, description = "Participation row ID")),
    request_body = UpdateParticipationStatusRequest,
    responses(
        (status = 200, description = "Row updated", body = ParticipationRecord),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Row not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "participation"
)]
async fn update_participation_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateParticipationStatusRequest>, JsonRejection>,
) -> Result<Json<ParticipationRecord>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;

    let updated = state
        .participation
        .update(&id, |row| row.status = req.status)
        .ok_or_else(|| AppError::NotFound(format!("participation row {id} not found")))?;
    state.notify(Collection::SportsParticipation, id, ChangeOp::Updated);
    if let Some(pool) = &state.pool {
        crate::db::participation::upsert(pool, &updated).await?;
    }

    tracing::info!(row_id = %id, status = %updated.status, "participation status updated");
    Ok(Json(updated))
}
