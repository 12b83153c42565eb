//! # Results API
//!
//! Admin-entered competition results. Teams can read their own results;
//! only admins may create, edit, or delete.
//!
//! ## Endpoints
//!
//! - `POST /v1/results` — record a result (admin)
//! - `GET /v1/results` — list results (admin all, team own)
//! - `GET /v1/results/:id` — get a result (admin or owning team)
//! - `PUT /v1/results/:id` — update a result (admin)
//! - `DELETE /v1/results/:id` — delete a result (admin)

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
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::{
    ActivityKind, ActivityScope, AppState, ChangeOp, Collection, ResultRecord, ResultStatus,
};

// ── Request DTOs ────────────────────────────────────────────────────

/// Request to record a result.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateResultRequest {
    pub team_id: Uuid,
    pub sport: Sport,
    pub score: String,
    pub position: Option<u32>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<ResultStatus>,
    pub notes: Option<String>,
}

impl Validate for CreateResultRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        if self.score.trim().is_empty() {
            Err(vec!["score must not be empty".to_string()])
        } else {
            Ok(())
        }
    }
}

/// Result edit request. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultRequest {
    pub score: Option<String>,
    pub position: Option<u32>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<ResultStatus>,
    pub notes: Option<String>,
}

/// Result list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ResultListQuery {
    pub team_id: Option<Uuid>,
    pub sport: Option<String>,
    pub status: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/results", get(list_results).post(create_result))
        .route(
            "/v1/results/:id",
            get(get_result).put(update_result).delete(delete_result),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/results — Record a result for a team.
#[utoipa::path(
    post,
    path = "/v1/results",
    request_body = CreateResultRequest,
    responses(
        (status = 201, description = "Result recorded", body = ResultRecord),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 422, description = "Validation errors", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "results"
)]
async fn create_result(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateResultRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ResultRecord>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;

    let team = state
        .teams
        .get(&req.team_id)
        .ok_or_else(|| AppError::Validation(format!("unknown team: {}", req.team_id)))?;

    let result = ResultRecord {
        id: Uuid::new_v4(),
        team_id: team.id,
        team_name: team.team_name.clone(),
        sport: req.sport,
        score: req.score.trim().to_string(),
        position: req.position,
        date: req.date.unwrap_or_else(Utc::now),
        status: req.status.unwrap_or(ResultStatus::Provisional),
        notes: req.notes,
    };

    state.results.insert(result.id, result.clone());
    state.notify(Collection::Results, result.id, ChangeOp::Created);
    if let Some(pool) = &state.pool {
        crate::db::results::upsert(pool, &result).await?;
    }

    state
        .record_activity(
            ActivityScope::Admin,
            ActivityKind::ResultUpdated,
            format!("Result recorded for {} in {}", team.team_name, result.sport.label()),
            Some(team.id),
        )
        .await;
    state
        .record_activity(
            ActivityScope::Team,
            ActivityKind::ResultUpdated,
            format!("New {} result: {}", result.sport.label(), result.score),
            Some(team.id),
        )
        .await;

    tracing::info!(result_id = %result.id, team_id = %team.id, sport = %result.sport, "result recorded");
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /v1/results — List results, newest first. Team callers see only
/// their own results regardless of filters.
#[utoipa::path(
    get,
    path = "/v1/results",
    params(ResultListQuery),
    responses(
        (status = 200, description = "Results matching the filters", body = Vec<ResultRecord>),
    ),
    security(("bearer" = [])),
    tag = "results"
)]
async fn list_results(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ResultListQuery>,
) -> Result<Json<Vec<ResultRecord>>, AppError> {
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
            ResultStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter: {raw}")))?,
        ),
    };

    let mut results: Vec<ResultRecord> = state
        .results
        .list()
        .into_iter()
        .filter(|r| {
            if caller.is_admin() {
                query.team_id.map_or(true, |id| r.team_id == id)
            } else {
                caller.user_id == Some(r.team_id)
            }
        })
        .filter(|r| sport.map_or(true, |s| r.sport == s))
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect();
    results.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(results))
}

/// GET /v1/results/:id — Fetch one result.
#[utoipa::path(
    get,
    path = "/v1/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result found", body = ResultRecord),
        (status = 404, description = "Result not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "results"
)]
async fn get_result(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultRecord>, AppError> {
    let result = state
        .results
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("result {id} not found")))?;
    if !caller.can_access_team(result.team_id) {
        return Err(AppError::Forbidden(
            "you may only access your own results".to_string(),
        ));
    }
    Ok(Json(result))
}

/// PUT /v1/results/:id — Update a result.
#[utoipa::path(
    put,
    path = "/v1/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    request_body = UpdateResultRequest,
    responses(
        (status = 200, description = "Result updated", body = ResultRecord),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Result not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "results"
)]
async fn update_result(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateResultRequest>, JsonRejection>,
) -> Result<Json<ResultRecord>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_json(body)?;

    if let Some(score) = &req.score {
        if score.trim().is_empty() {
            return Err(AppError::Validation("score must not be empty".to_string()));
        }
    }

    let updated = state
        .results
        .update(&id, |result| {
            if let Some(score) = &req.score {
                result.score = score.trim().to_string();
            }
            if let Some(position) = req.position {
                result.position = Some(position);
            }
            if let Some(date) = req.date {
                result.date = date;
            }
            if let Some(status) = req.status {
                result.status = status;
            }
            if let Some(notes) = &req.notes {
                result.notes = Some(notes.clone());
            }
        })
        .ok_or_else(|| AppError::NotFound(format!("result {id} not found")))?;
    state.notify(Collection::Results, id, ChangeOp::Updated);
    if let Some(pool) = &state.pool {
        crate::db::results::upsert(pool, &updated).await?;
    }

    state
        .record_activity(
            ActivityScope::Admin,
            ActivityKind::ResultUpdated,
            format!("Result updated for {}", updated.team_name),
            Some(updated.team_id),
        )
        .await;
    state
        .record_activity(
            ActivityScope::Team,
            ActivityKind::ResultUpdated,
            format!("{} result updated: {}", updated.sport.label(), updated.score),
            Some(updated.team_id),
        )
        .await;

    tracing::info!(result_id = %id, "result updated");
    Ok(Json(updated))
}

/// DELETE /v1/results/:id — Delete a result.
#[utoipa::path(
    delete,
    path = "/v1/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Result not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "results"
)]
async fn delete_result(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;

    state
        .results
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("result {id} not found")))?;
    state.notify(Collection::Results, id, ChangeOp::Deleted);
    if let Some(pool) = &state.pool {
        crate::db::results::delete(pool, id).await?;
    }

    tracing::info!(result_id = %id, "result deleted");
    Ok(StatusCode::NO_CONTENT)
}
