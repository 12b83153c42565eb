//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fest Portal API",
        version = "0.3.2",
        description = "Sports festival registration portal: team registration and roster management, event scheduling, results, sports participation tracking, and the admin console.",
        license(name = "MIT")
    ),
    paths(
        // Auth
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::session,
        // Teams
        crate::routes::teams::list_teams,
        crate::routes::teams::get_team,
        crate::routes::teams::update_team,
        crate::routes::teams::update_team_status,
        crate::routes::teams::delete_team,
        crate::routes::teams::team_results,
        crate::routes::teams::team_activity,
        // Events
        crate::routes::events::create_event,
        crate::routes::events::list_events,
        crate::routes::events::get_event,
        crate::routes::events::update_event,
        crate::routes::events::delete_event,
        // Results
        crate::routes::results::create_result,
        crate::routes::results::list_results,
        crate::routes::results::get_result,
        crate::routes::results::update_result,
        crate::routes::results::delete_result,
        // Participation
        crate::routes::participation::list_participation,
        crate::routes::participation::update_participation_status,
        // Activity
        crate::routes::activity::list_activity,
        // Admin console
        crate::routes::admin::stats,
        crate::routes::admin::export_teams_csv,
        crate::routes::admin::export_teams_json,
        // Change feed
        crate::routes::watch::watch,
    ),
    components(schemas(
        // Domain types
        fest_core::sport::Sport,
        fest_core::team::TeamCategory,
        fest_core::team::TeamStatus,
        fest_core::team::Captain,
        fest_core::team::Member,
        fest_core::validate::CaptainForm,
        fest_core::validate::MemberForm,
        fest_core::validate::RegistrationForm,
        // State record types
        crate::state::TeamRecord,
        crate::state::EventRecord,
        crate::state::EventStatus,
        crate::state::ResultRecord,
        crate::state::ResultStatus,
        crate::state::ParticipationRecord,
        crate::state::ParticipationStatus,
        crate::state::ActivityRecord,
        crate::state::ActivityScope,
        crate::state::ActivityKind,
        crate::state::ChangeNotice,
        crate::state::Collection,
        crate::state::ChangeOp,
        crate::auth::Role,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Auth DTOs
        crate::routes::auth::LoginRequest,
        crate::routes::auth::UserView,
        crate::routes::auth::RegisterResponse,
        crate::routes::auth::LoginResponse,
        crate::routes::auth::SessionResponse,
        // Team DTOs
        crate::routes::teams::UpdateTeamRequest,
        crate::routes::teams::UpdateTeamStatusRequest,
        // Event DTOs
        crate::routes::events::CreateEventRequest,
        crate::routes::events::UpdateEventRequest,
        // Result DTOs
        crate::routes::results::CreateResultRequest,
        crate::routes::results::UpdateResultRequest,
        // Participation DTOs
        crate::routes::participation::UpdateParticipationStatusRequest,
        // Admin DTOs
        crate::routes::admin::SportStat,
        crate::routes::admin::StatsResponse,
        crate::routes::admin::TeamsExport,
    )),
    tags(
        (name = "auth", description = "Registration, login, and sessions"),
        (name = "teams", description = "Team records and rosters"),
        (name = "events", description = "Event schedule"),
        (name = "results", description = "Competition results"),
        (name = "participation", description = "Per-team-per-sport participation rows"),
        (name = "activity", description = "Activity feeds"),
        (name = "admin", description = "Admin console: statistics and exports"),
        (name = "watch", description = "Change notification stream"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
