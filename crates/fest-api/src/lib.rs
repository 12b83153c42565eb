//! # fest-api — Axum API Service for the Fest Portal
//!
//! The portal backend for a multi-sport festival: team registration with
//! roster validation, an admin console, the event schedule, results, and
//! per-sport participation tracking.
//!
//! ## API Surface
//!
//! | Prefix                | Module                       | Domain            |
//! |-----------------------|------------------------------|-------------------|
//! | `/v1/auth/*`          | [`routes::auth`]             | Accounts, sessions |
//! | `/v1/teams/*`         | [`routes::teams`]            | Teams and rosters |
//! | `/v1/events/*`        | [`routes::events`]           | Event schedule    |
//! | `/v1/results/*`       | [`routes::results`]          | Results           |
//! | `/v1/participation/*` | [`routes::participation`]    | Participation rows |
//! | `/v1/activity`        | [`routes::activity`]         | Activity feeds    |
//! | `/v1/admin/*`         | [`routes::admin`]            | Stats and exports |
//! | `/v1/watch`           | [`routes::watch`]            | Change feed (SSE) |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated spec via utoipa derive macros at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod password;
pub mod routes;
pub mod state;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

/// Check if metrics are enabled via the `FEST_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything other
/// than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("FEST_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: state.config.rate_limit_max_requests,
        window_secs: state.config.rate_limit_window_secs,
    });
    let metrics_on = metrics_enabled();

    // Body size limit: 2 MiB. Registration payloads with a full roster stay
    // well under this.
    //
    // Middleware execution order (outermost → innermost):
    //   TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
    //
    // Auth runs before rate limiting so authenticated callers are limited
    // per account rather than per connection.
    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::teams::router())
        .merge(routes::events::router())
        .merge(routes::results::router())
        .merge(routes::participation::router())
        .merge(routes::activity::router())
        .merge(routes::admin::router())
        .merge(routes::watch::router())
        .merge(openapi::router());

    let mut api = api
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .layer(Extension(limiter))
        .with_state(state.clone());

    // Unauthenticated health probes — readiness checks the database when
    // one is configured.
    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    // Mount /metrics when enabled (unauthenticated, like health probes).
    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
/// With a database configured, readiness means the pool answers a ping.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.pool {
        if let Err(err) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %err, "readiness probe failed database ping");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
        }
    }
    (StatusCode::OK, "ready")
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Request counters accumulate in-process; domain gauges are computed from
/// current `AppState` on each scrape (pull model).
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> String {
    let mut out = metrics.render();

    let teams = state.teams.list();
    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut participants: usize = 0;
    for team in &teams {
        *by_status.entry(team.status.as_str()).or_default() += 1;
        participants += team.participant_count();
    }

    out.push_str("# HELP fest_teams_total Registered teams by status.\n");
    out.push_str("# TYPE fest_teams_total gauge\n");
    for (status, count) in &by_status {
        let _ = writeln!(out, "fest_teams_total{{status=\"{status}\"}} {count}");
    }
    out.push_str("# HELP fest_participants_total Registered participants, captains included.\n");
    out.push_str("# TYPE fest_participants_total gauge\n");
    let _ = writeln!(out, "fest_participants_total {participants}");
    out.push_str("# HELP fest_events_total Scheduled events.\n");
    out.push_str("# TYPE fest_events_total gauge\n");
    let _ = writeln!(out, "fest_events_total {}", state.events.len());

    out
}
