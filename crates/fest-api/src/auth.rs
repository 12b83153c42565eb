//! # Authentication & Authorization
//!
//! Bearer-token auth with two kinds of credentials:
//!
//! - **User sessions** — opaque uuid tokens issued at login/registration and
//!   held in the session store. A session carries the account's role and id;
//!   team accounts may only touch their own records.
//! - **Operator token** — the static `FEST_ADMIN_TOKEN`, compared in
//!   constant time, granting admin access for ops tooling.
//!
//! With `FEST_AUTH_DISABLED` set every request runs as an admin. Local
//! development only.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, SessionRecord, UserRecord};

/// Access role. Ordered so that `Team < Admin`; a role check passes when
/// the caller's role is at least the required one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Team,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Team => "team",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "team" => Some(Role::Team),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, attached to the request by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: Role,
    /// The account id for session callers; `None` for the operator token.
    pub user_id: Option<Uuid>,
}

impl CallerIdentity {
    /// The operator-token (or auth-disabled) identity.
    pub fn operator() -> Self {
        Self {
            role: Role::Admin,
            user_id: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role >= Role::Admin
    }

    /// Whether the caller may read or edit the given team. The team id
    /// equals the owning user's id.
    pub fn can_access_team(&self, team_id: Uuid) -> bool {
        self.is_admin() || self.user_id == Some(team_id)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("missing credentials".to_string()))
    }
}

/// Require at least the given role.
pub fn require_role(caller: &CallerIdentity, required: Role) -> Result<(), AppError> {
    if caller.role >= required {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "requires {required} access"
        )))
    }
}

/// Constant-time token comparison. The length check short-circuits, which
/// leaks only the length, never the content.
fn constant_time_token_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Pull the bearer token out of an `Authorization` header value.
fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Routes reachable without credentials.
fn is_public_path(path: &str) -> bool {
    path.starts_with("/health")
        || path == "/metrics"
        || path == "/openapi.json"
        || path == "/v1/auth/register"
        || path == "/v1/auth/login"
}

/// Resolve a bearer token to a caller identity.
pub fn authenticate(state: &AppState, token: &str) -> Result<CallerIdentity, AppError> {
    if let Some(admin_token) = &state.config.admin_token {
        if constant_time_token_eq(token, admin_token) {
            return Ok(CallerIdentity::operator());
        }
    }
    let session_token = Uuid::parse_str(token)
        .map_err(|_| AppError::Unauthorized("invalid bearer token".to_string()))?;
    let session = state
        .sessions
        .get(&session_token)
        .ok_or(AppError::Auth("session-expired"))?;
    Ok(CallerIdentity {
        role: session.role,
        user_id: Some(session.user_id),
    })
}

/// Authentication middleware. Attaches a [`CallerIdentity`] extension to
/// every request past the public paths.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.config.auth_disabled {
        request.extensions_mut().insert(CallerIdentity::operator());
        return next.run(request).await;
    }
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer);

    let Some(token) = token else {
        return AppError::Unauthorized("missing bearer token".to_string()).into_response();
    };

    match authenticate(&state, token) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Issue a session for a freshly authenticated user.
pub fn issue_session(state: &AppState, user: &UserRecord) -> SessionRecord {
    let session = SessionRecord {
        token: Uuid::new_v4(),
        user_id: user.id,
        role: user.role,
        created_at: Utc::now(),
    };
    state.sessions.insert(session.token, session.clone());
    session
}

/// Revoke a session by token. Returns whether one existed.
pub fn revoke_session(state: &AppState, token: Uuid) -> bool {
    state.sessions.remove(&token).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;

    fn state_with_token(token: &str) -> AppState {
        AppState::new(AppConfig {
            admin_token: Some(token.to_string()),
            ..AppConfig::default()
        })
    }

    fn user(role: Role) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: "captain@example.com".to_string(),
            display_name: "Captain".to_string(),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
            last_login: None,
            is_active: true,
            permissions: vec![],
        }
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Team < Role::Admin);
        assert!(require_role(&CallerIdentity::operator(), Role::Team).is_ok());
        let team_caller = CallerIdentity {
            role: Role::Team,
            user_id: Some(Uuid::new_v4()),
        };
        assert!(require_role(&team_caller, Role::Admin).is_err());
    }

    #[test]
    fn team_access_is_scoped_to_own_team() {
        let own_id = Uuid::new_v4();
        let caller = CallerIdentity {
            role: Role::Team,
            user_id: Some(own_id),
        };
        assert!(caller.can_access_team(own_id));
        assert!(!caller.can_access_team(Uuid::new_v4()));
        assert!(CallerIdentity::operator().can_access_team(Uuid::new_v4()));
    }

    #[test]
    fn operator_token_authenticates_as_admin() {
        let state = state_with_token("op-secret");
        let identity = authenticate(&state, "op-secret").unwrap();
        assert!(identity.is_admin());
        assert!(identity.user_id.is_none());
    }

    #[test]
    fn wrong_operator_token_rejected() {
        let state = state_with_token("op-secret");
        assert!(authenticate(&state, "op-secreT").is_err());
        assert!(authenticate(&state, "not-even-a-uuid").is_err());
    }

    #[test]
    fn session_tokens_resolve_and_revoke() {
        let state = AppState::new(AppConfig::default());
        let user = user(Role::Team);
        state.users.insert(user.id, user.clone());
        let session = issue_session(&state, &user);

        let identity = authenticate(&state, &session.token.to_string()).unwrap();
        assert_eq!(identity.role, Role::Team);
        assert_eq!(identity.user_id, Some(user.id));

        assert!(revoke_session(&state, session.token));
        assert!(authenticate(&state, &session.token.to_string()).is_err());
        assert!(!revoke_session(&state, session.token));
    }

    #[test]
    fn unknown_session_maps_to_session_expired() {
        let state = AppState::new(AppConfig::default());
        let err = authenticate(&state, &Uuid::new_v4().to_string()).unwrap_err();
        assert!(matches!(err, AppError::Auth("session-expired")));
    }

    #[test]
    fn public_paths() {
        assert!(is_public_path("/health/liveness"));
        assert!(is_public_path("/health/readiness"));
        assert!(is_public_path("/metrics"));
        assert!(is_public_path("/openapi.json"));
        assert!(is_public_path("/v1/auth/login"));
        assert!(is_public_path("/v1/auth/register"));
        assert!(!is_public_path("/v1/teams"));
        assert!(!is_public_path("/v1/auth/session"));
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("bearer abc"), None);
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abc", "abd"));
        assert!(!constant_time_token_eq("abc", "abcd"));
        assert!(constant_time_token_eq("", ""));
    }
}
