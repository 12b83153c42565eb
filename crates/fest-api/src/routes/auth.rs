//! # Auth API
//!
//! Account registration (bundled with team registration), login, logout,
//! and the current-session endpoint.
//!
//! ## Endpoints
//!
//! - `POST /v1/auth/register` — register account + team (public)
//! - `POST /v1/auth/login` — sign in (public)
//! - `POST /v1/auth/logout` — revoke the current session
//! - `GET /v1/auth/session` — current caller identity

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fest_core::validate::{validate_registration, RegistrationForm};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{issue_session, revoke_session, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::password::{hash_password, verify_password};
use crate::state::{
    ActivityKind, ActivityScope, AppState, ChangeOp, Collection, TeamRecord, UserRecord,
};
use fest_core::team::TeamStatus;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Sign-in request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.email.trim().is_empty() {
            errors.push("email must not be empty".to_string());
        }
        if self.password.is_empty() {
            errors.push("password must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Account view returned from auth endpoints. Never includes the hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            last_login: user.last_login,
        }
    }
}

/// Successful registration response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub token: Uuid,
    pub user: UserView,
    pub team: TeamRecord,
}

/// Successful login response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: UserView,
}

/// Current-session response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/session", get(session))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /v1/auth/register — Register an account and its team in one step.
///
/// Runs the full registration validator; any violation blocks the whole
/// submission. On success the team id equals the new user's id, one
/// participation row is created per selected sport, and a session token is
/// returned.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegistrationForm,
    responses(
        (status = 201, description = "Account and team created", body = RegisterResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation errors", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let form = extract_json(body)?;
    let new_team = validate_registration(&form)?;

    if state.user_by_email(&new_team.captain.email).is_some() {
        return Err(AppError::Auth("email-already-in-use"));
    }

    let now = Utc::now();
    let user = UserRecord {
        id: Uuid::new_v4(),
        email: new_team.captain.email.clone(),
        display_name: new_team.captain.name.clone(),
        role: Role::Team,
        password_hash: hash_password(&form.password)?,
        created_at: now,
        last_login: Some(now),
        is_active: true,
        permissions: vec!["read".to_string(), "write".to_string()],
    };

    // The team document id is the owning user's id.
    let team = TeamRecord {
        id: user.id,
        team_name: new_team.team_name,
        institution: new_team.institution,
        city: new_team.city,
        category: new_team.category,
        captain: new_team.captain,
        members: new_team.members,
        sports: new_team.sports,
        status: TeamStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.users.insert(user.id, user.clone());
    state.notify(Collection::Users, user.id, ChangeOp::Created);
    state.teams.insert(team.id, team.clone());
    state.notify(Collection::Teams, team.id, ChangeOp::Created);

    let sync = state.reconcile_participation(team.id, &team.team_name, &team.sports, now);
    for row in &sync.added {
        state.notify(Collection::SportsParticipation, row.id, ChangeOp::Created);
    }

    if let Some(pool) = &state.pool {
        crate::db::users::upsert(pool, &user).await?;
        crate::db::teams::upsert(pool, &team).await?;
        for row in &sync.added {
            crate::db::participation::upsert(pool, row).await?;
        }
    }

    state
        .record_activity(
            ActivityScope::Admin,
            ActivityKind::TeamRegistered,
            format!("New team registered: {}", team.team_name),
            Some(team.id),
        )
        .await;
    state
        .record_activity(
            ActivityScope::Team,
            ActivityKind::Registration,
            format!("Team {} registered for the fest", team.team_name),
            Some(team.id),
        )
        .await;

    let session = issue_session(&state, &user);
    tracing::info!(team_id = %team.id, team_name = %team.team_name, "team registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token: session.token,
            user: UserView::from(&user),
            team,
        }),
    ))
}

/// POST /v1/auth/login — Sign in with email and password.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 403, description = "Account disabled", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let user = state
        .user_by_email(req.email.trim())
        .ok_or(AppError::Auth("user-not-found"))?;
    if !user.is_active {
        return Err(AppError::Auth("user-disabled"));
    }
    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::invalid_credentials());
    }

    let now = Utc::now();
    let user = state
        .users
        .update(&user.id, |u| u.last_login = Some(now))
        .ok_or_else(|| AppError::Internal("account vanished during login".to_string()))?;
    if let Some(pool) = &state.pool {
        crate::db::users::upsert(pool, &user).await?;
    }

    let session = issue_session(&state, &user);
    tracing::info!(user_id = %user.id, role = %user.role, "user signed in");

    Ok(Json(LoginResponse {
        token: session.token,
        user: UserView::from(&user),
    }))
}

/// POST /v1/auth/logout — Revoke the presented session token.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "No session to revoke", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|t| Uuid::parse_str(t.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized("no session token presented".to_string()))?;

    if revoke_session(&state, token) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Auth("session-expired"))
    }
}

/// GET /v1/auth/session — The caller's identity. Dashboards call this on
/// load to decide which surface to show.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
async fn session(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<SessionResponse> {
    let user = caller
        .user_id
        .and_then(|id| state.users.get(&id))
        .as_ref()
        .map(UserView::from);
    Json(SessionResponse {
        role: caller.role,
        user,
    })
}
