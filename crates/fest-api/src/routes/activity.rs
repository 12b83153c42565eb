//! # Activity Feed API
//!
//! The admin console's recent-activity list. Per-team feeds are served
//! under `/v1/teams/:id/activity`.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::state::{ActivityRecord, ActivityScope, AppState};

/// Feed query: optional scope (defaults to admin) and entry limit
/// (defaults to 10).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ActivityQuery {
    pub scope: Option<String>,
    pub limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/activity", get(list_activity))
}

/// GET /v1/activity — Recent activity, newest first.
#[utoipa::path(
    get,
    path = "/v1/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent activity entries", body = Vec<ActivityRecord>),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "activity"
)]
async fn list_activity(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityRecord>>, AppError> {
    require_role(&caller, Role::Admin)?;

    let scope = match query.scope.as_deref() {
        None => ActivityScope::Admin,
        Some(raw) => ActivityScope::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("unknown scope filter: {raw}")))?,
    };
    let limit = query.limit.unwrap_or(10);

    let mut entries: Vec<ActivityRecord> = state
        .activity
        .list()
        .into_iter()
        .filter(|a| a.scope == scope)
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    Ok(Json(entries))
}
