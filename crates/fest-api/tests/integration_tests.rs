//! # Integration Tests for fest-api
//!
//! Tests the registration flow end to end, role enforcement, the team
//! edit participation diff, events and results CRUD, the admin console,
//! authentication middleware, and OpenAPI spec generation.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fest_api::state::{AppConfig, AppState};

const OPERATOR_TOKEN: &str = "test-operator-token";

/// Helper: build the test app with auth disabled (every request is admin).
fn test_app() -> axum::Router {
    let state = AppState::new(AppConfig {
        auth_disabled: true,
        ..AppConfig::default()
    });
    fest_api::app(state)
}

/// Helper: build the test app with auth enabled and a static operator token.
fn test_app_with_auth() -> axum::Router {
    let state = AppState::new(AppConfig {
        admin_token: Some(OPERATOR_TOKEN.to_string()),
        ..AppConfig::default()
    });
    fest_api::app(state)
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// A registration form that passes every validator rule.
fn registration_form(email: &str, team_name: &str) -> Value {
    json!({
        "teamName": team_name,
        "institution": "Punjab University",
        "city": "Lahore",
        "category": "university",
        "captain": {
            "name": "Ayesha Khan",
            "email": email,
            "phone": "0300 1234567",
            "cnic": "35202-1234567-1"
        },
        "password": "Abc123!",
        "confirmPassword": "Abc123!",
        "members": [
            {
                "name": "Bilal Ahmed",
                "phone": "03017654321",
                "cnic": "35202-7654321-3",
                "sports": ["cricket", "futsal"]
            }
        ],
        "sports": ["cricket", "badminton"]
    })
}

/// Register a team and return (token, team_id as string).
async fn register_team(app: &axum::Router, email: &str, team_name: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/register",
            None,
            &registration_form(email, team_name),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["team"]["id"].as_str().unwrap().to_string(),
    )
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app();
    let response = app.oneshot(get("/health/liveness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe_without_database() {
    let app = test_app();
    let response = app.oneshot(get("/health/readiness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn test_register_creates_account_team_and_participation() {
    let app = test_app_with_auth();
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/register",
            None,
            &registration_form("ayesha@example.com", "Lahore Lions"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;

    // The team id is the account id.
    assert_eq!(body["team"]["id"], body["user"]["id"]);
    assert_eq!(body["team"]["status"], "pending");
    assert_eq!(body["user"]["role"], "team");
    // Captain phone was normalized on the way in.
    assert_eq!(body["team"]["captain"]["phone"], "+923001234567");
    // Team sports are the union of the selection and member sports.
    let sports: Vec<&str> = body["team"]["sports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert!(sports.contains(&"cricket"));
    assert!(sports.contains(&"badminton"));
    assert!(sports.contains(&"futsal"));

    // One participation row per team sport, visible to the new session.
    let token = body["token"].as_str().unwrap();
    let response = app
        .oneshot(get("/v1/participation", Some(token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().unwrap().len(), sports.len());
    for row in rows.as_array().unwrap() {
        assert_eq!(row["status"], "registered");
    }
}

#[tokio::test]
async fn test_register_rejects_invalid_form_with_error_list() {
    let app = test_app_with_auth();
    let mut form = registration_form("bad@example.com", "Bad Form FC");
    form["sports"] = json!([]);
    form["members"][0]["sports"] = json!([]);
    form["captain"]["email"] = json!("not-an-email");
    form["password"] = json!("abc123!");
    form["confirmPassword"] = json!("abc123!");

    let response = app
        .oneshot(send_json("POST", "/v1/auth/register", None, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let errors = body["error"]["details"]["errors"].as_array().unwrap();
    // Bad email, missing uppercase, no sports selected.
    assert!(errors.len() >= 3);
    assert!(errors
        .iter()
        .any(|e| e.as_str().unwrap().contains("uppercase")));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = test_app_with_auth();
    register_team(&app, "dup@example.com", "First FC").await;

    let response = app
        .oneshot(send_json(
            "POST",
            "/v1/auth/register",
            None,
            &registration_form("DUP@example.com", "Second FC"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_enforces_member_cap_for_category() {
    let app = test_app_with_auth();
    let mut form = registration_form("capped@example.com", "Roster Stuffers");
    form["category"] = json!("school");
    // School caps at 10 members beyond the captain.
    let members: Vec<Value> = (0..11)
        .map(|i| {
            json!({
                "name": format!("Member {i}"),
                "phone": format!("030012345{i:02}"),
                "cnic": format!("35202-12345{i:02}-1"),
                "sports": ["cricket"]
            })
        })
        .collect();
    form["members"] = json!(members);

    let response = app
        .oneshot(send_json("POST", "/v1/auth/register", None, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Login / Session ----------------------------------------------------------

#[tokio::test]
async fn test_login_logout_session_flow() {
    let app = test_app_with_auth();
    register_team(&app, "flow@example.com", "Flow FC").await;

    // Wrong password.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/login",
            None,
            &json!({"email": "flow@example.com", "password": "Wrong123!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown account.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/login",
            None,
            &json!({"email": "nobody@example.com", "password": "Abc123!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct credentials.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/auth/login",
            None,
            &json!({"email": "flow@example.com", "password": "Abc123!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert!(body["user"]["lastLogin"].is_string());

    // Session reflects the caller.
    let response = app
        .clone()
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "team");
    assert_eq!(body["user"]["email"], "flow@example.com");

    // Logout revokes the session.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/auth/logout")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_operator_token_gets_admin_session() {
    let app = test_app_with_auth();
    let response = app
        .oneshot(get("/v1/auth/session", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = test_app_with_auth();
    let response = app.oneshot(get("/v1/events", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Role Enforcement ---------------------------------------------------------

#[tokio::test]
async fn test_team_callers_cannot_use_admin_surface() {
    let app = test_app_with_auth();
    let (token, _) = register_team(&app, "team@example.com", "Team FC").await;

    for uri in ["/v1/teams", "/v1/activity", "/v1/admin/stats"] {
        let response = app.clone().oneshot(get(uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "GET {uri}");
    }

    let response = app
        .oneshot(send_json(
            "POST",
            "/v1/events",
            Some(&token),
            &json!({
                "name": "Cricket Final",
                "sport": "cricket",
                "startDate": "2026-10-01T09:00:00Z",
                "endDate": "2026-10-01T18:00:00Z",
                "venue": "Main Ground"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_team_cannot_read_another_teams_record() {
    let app = test_app_with_auth();
    let (token_a, _) = register_team(&app, "a@example.com", "Alpha FC").await;
    let (_, team_b) = register_team(&app, "b@example.com", "Beta FC").await;

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/teams/{team_b}"), Some(&token_a)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The operator can.
    let response = app
        .oneshot(get(&format!("/v1/teams/{team_b}"), Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Teams --------------------------------------------------------------------

#[tokio::test]
async fn test_list_teams_filters() {
    let app = test_app_with_auth();
    register_team(&app, "lhr@example.com", "Lahore Lions").await;
    let mut form = registration_form("khi@example.com", "Karachi Kings");
    form["city"] = json!("Karachi");
    let response = app
        .clone()
        .oneshot(send_json("POST", "/v1/auth/register", None, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/v1/teams?city=Karachi", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["teamName"], "Karachi Kings");

    let response = app
        .clone()
        .oneshot(get("/v1/teams?q=lions", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["teamName"], "Lahore Lions");

    let response = app
        .oneshot(get("/v1/teams?status=approved", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_team_edit_reconciles_participation_rows() {
    let app = test_app_with_auth();
    let (token, team_id) = register_team(&app, "edit@example.com", "Editable FC").await;

    // Replace the sports selection: drop badminton, keep cricket, add volleyball.
    // Futsal survives through the member roster union.
    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/v1/teams/{team_id}"),
            Some(&token),
            &json!({"sports": ["cricket", "volleyball"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let sports: Vec<&str> = body["sports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert!(sports.contains(&"volleyball"));
    assert!(!sports.contains(&"badminton"));

    let response = app
        .oneshot(get("/v1/participation", Some(&token)))
        .await
        .unwrap();
    let rows = body_json(response).await;
    let row_sports: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["sport"].as_str().unwrap())
        .collect();
    assert!(row_sports.contains(&"volleyball"));
    assert!(row_sports.contains(&"cricket"));
    assert!(row_sports.contains(&"futsal"));
    assert!(!row_sports.contains(&"badminton"));
}

#[tokio::test]
async fn test_replayed_team_edit_does_not_duplicate_participation() {
    let app = test_app_with_auth();
    let (token, team_id) = register_team(&app, "replay@example.com", "Replay FC").await;

    // Two identical edits, as when a client retries or two tabs submit the
    // same change. The second must not insert a second row per sport.
    let body = json!({"sports": ["cricket", "volleyball"]});
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(send_json(
                "PUT",
                &format!("/v1/teams/{team_id}"),
                Some(&token),
                &body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get("/v1/participation", Some(&token)))
        .await
        .unwrap();
    let rows = body_json(response).await;
    let mut row_sports: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["sport"].as_str().unwrap())
        .collect();
    row_sports.sort_unstable();
    let mut deduped = row_sports.clone();
    deduped.dedup();
    assert_eq!(row_sports, deduped, "duplicate participation rows: {row_sports:?}");
    assert!(row_sports.contains(&"volleyball"));
    assert!(row_sports.contains(&"cricket"));
}

#[tokio::test]
async fn test_team_edit_revalidates_roster() {
    let app = test_app_with_auth();
    let (token, team_id) = register_team(&app, "strict@example.com", "Strict FC").await;

    // A member with four sports must be rejected.
    let response = app
        .oneshot(send_json(
            "PUT",
            &format!("/v1/teams/{team_id}"),
            Some(&token),
            &json!({"members": [{
                "name": "Overbooked",
                "phone": "03001112233",
                "cnic": "35202-1112233-1",
                "sports": ["cricket", "futsal", "volleyball", "badminton"]
            }]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_status_update_and_delete_cascade() {
    let app = test_app_with_auth();
    let (team_token, team_id) = register_team(&app, "gone@example.com", "Gone FC").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            &format!("/v1/teams/{team_id}/status"),
            Some(OPERATOR_TOKEN),
            &json!({"status": "approved"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "approved");

    // A recorded result, so the delete has something to cascade over.
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/results",
            Some(OPERATOR_TOKEN),
            &json!({"teamId": team_id, "sport": "cricket", "score": "150/7"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/teams/{team_id}"))
                .header("authorization", format!("Bearer {OPERATOR_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The record and its participation rows are gone.
    let response = app
        .clone()
        .oneshot(get(&format!("/v1/teams/{team_id}"), Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get(
            &format!("/v1/participation?team_id={team_id}"),
            Some(OPERATOR_TOKEN),
        ))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    // So are the team's results.
    let response = app
        .clone()
        .oneshot(get("/v1/results", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    // The owning account went with the team: its session no longer
    // authenticates and its credentials no longer sign in.
    let response = app
        .clone()
        .oneshot(get("/v1/auth/session", Some(&team_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(send_json(
            "POST",
            "/v1/auth/login",
            None,
            &json!({"email": "gone@example.com", "password": "Abc123!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Events -------------------------------------------------------------------

fn event_body() -> Value {
    json!({
        "name": "Cricket Final",
        "sport": "cricket",
        "startDate": "2026-10-01T09:00:00Z",
        "endDate": "2026-10-01T18:00:00Z",
        "venue": "Main Ground",
        "maxTeams": 2
    })
}

#[tokio::test]
async fn test_event_crud() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(send_json("POST", "/v1/events", None, &event_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let event = body_json(response).await;
    let id = event["id"].as_str().unwrap().to_string();
    assert_eq!(event["status"], "upcoming");
    assert!(event["participatingTeams"].as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/v1/events/{id}"),
            None,
            &json!({"status": "ongoing", "venue": "Second Ground"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "ongoing");
    assert_eq!(updated["venue"], "Second Ground");

    let response = app
        .clone()
        .oneshot(get("/v1/events?status=ongoing", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/events/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get(&format!("/v1/events/{id}"), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_rejects_invalid_dates() {
    let app = test_app();
    let mut body = event_body();
    body["endDate"] = json!("2026-09-30T09:00:00Z");
    let response = app
        .oneshot(send_json("POST", "/v1/events", None, &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_event_participation_respects_max_teams() {
    let app = test_app_with_auth();
    let (_, team_a) = register_team(&app, "ea@example.com", "Event Alpha").await;
    let (_, team_b) = register_team(&app, "eb@example.com", "Event Beta").await;
    let (_, team_c) = register_team(&app, "ec@example.com", "Event Gamma").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/events",
            Some(OPERATOR_TOKEN),
            &event_body(),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Unknown team id is a validation error.
    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/v1/events/{id}"),
            Some(OPERATOR_TOKEN),
            &json!({"participatingTeams": [uuid::Uuid::new_v4()]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Two teams fit within maxTeams = 2.
    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/v1/events/{id}"),
            Some(OPERATOR_TOKEN),
            &json!({"participatingTeams": [team_a, team_b]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A third does not.
    let response = app
        .oneshot(send_json(
            "PUT",
            &format!("/v1/events/{id}"),
            Some(OPERATOR_TOKEN),
            &json!({"participatingTeams": [team_a, team_b, team_c]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// -- Results ------------------------------------------------------------------

#[tokio::test]
async fn test_results_are_scoped_to_the_owning_team() {
    let app = test_app_with_auth();
    let (token_a, team_a) = register_team(&app, "ra@example.com", "Result Alpha").await;
    let (token_b, _) = register_team(&app, "rb@example.com", "Result Beta").await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/results",
            Some(OPERATOR_TOKEN),
            &json!({
                "teamId": team_a,
                "sport": "cricket",
                "score": "152/7",
                "position": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let result = body_json(response).await;
    assert_eq!(result["teamName"], "Result Alpha");
    assert_eq!(result["status"], "provisional");
    let result_id = result["id"].as_str().unwrap().to_string();

    // The owning team sees it; the other team does not.
    let response = app
        .clone()
        .oneshot(get("/v1/results", Some(&token_a)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get("/v1/results", Some(&token_b)))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/results/{result_id}"), Some(&token_b)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Teams cannot write results.
    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/v1/results/{result_id}"),
            Some(&token_a),
            &json!({"score": "200/3"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin edits land in the team feed.
    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/v1/results/{result_id}"),
            Some(OPERATOR_TOKEN),
            &json!({"score": "200/3", "status": "final"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "final");

    let response = app
        .oneshot(get(
            &format!("/v1/teams/{team_a}/activity"),
            Some(&token_a),
        ))
        .await
        .unwrap();
    let feed = body_json(response).await;
    assert!(feed
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["kind"] == "result_updated"));
}

// -- Admin Console ------------------------------------------------------------

#[tokio::test]
async fn test_stats_counts_teams_and_participants() {
    let app = test_app_with_auth();
    register_team(&app, "s1@example.com", "Stat One").await;
    register_team(&app, "s2@example.com", "Stat Two").await;

    let response = app
        .oneshot(get("/v1/admin/stats", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["totalTeams"], 2);
    // Captain plus one member per team.
    assert_eq!(stats["totalParticipants"], 4);
    assert_eq!(stats["pendingTeams"], 2);
    assert_eq!(stats["approvedTeams"], 0);
    assert_eq!(stats["teamsByCity"]["Lahore"], 2);
    assert_eq!(stats["teamsByCategory"]["university"], 2);
    let cricket = stats["sportsOverview"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["sport"] == "cricket")
        .unwrap();
    assert_eq!(cricket["teamCount"], 2);
}

#[tokio::test]
async fn test_csv_export_layout() {
    let app = test_app_with_auth();
    register_team(&app, "csv@example.com", "CSV United").await;

    let response = app
        .oneshot(get("/v1/admin/export/teams.csv", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    let body = body_string(response).await;
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "\"Team Name\",\"Category\",\"City\",\"Institution\",\"Captain Name\",\"Captain Phone\",\"Members Count\",\"Sports\",\"Status\""
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("\"CSV United\",\"university\",\"Lahore\""));
    // Captain plus one member.
    assert!(row.contains("\"2\""));
    assert!(row.contains("\"pending\""));
}

#[tokio::test]
async fn test_json_export_envelope() {
    let app = test_app_with_auth();
    register_team(&app, "json@example.com", "JSON FC").await;

    let response = app
        .oneshot(get("/v1/admin/export/teams.json", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["teams"].as_array().unwrap().len(), 1);
    assert!(body["events"].as_array().unwrap().is_empty());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_activity_feed_records_registrations() {
    let app = test_app_with_auth();
    register_team(&app, "act@example.com", "Active FC").await;

    let response = app
        .oneshot(get("/v1/activity", Some(OPERATOR_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let feed = body_json(response).await;
    assert!(feed
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["kind"] == "team_registered"));
}

// -- Watch --------------------------------------------------------------------

#[tokio::test]
async fn test_watch_rejects_unknown_collection() {
    let app = test_app();
    let response = app
        .oneshot(get("/v1/watch?collection=bogus", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Rate Limiting ------------------------------------------------------------

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let state = AppState::new(AppConfig {
        auth_disabled: true,
        rate_limit_max_requests: 2,
        ..AppConfig::default()
    });
    let app = fest_api::app(state);

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/v1/events", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.oneshot(get("/v1/events", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// -- OpenAPI / Metrics --------------------------------------------------------

#[tokio::test]
async fn test_openapi_spec_lists_routes() {
    let app = test_app();
    let response = app.oneshot(get("/openapi.json", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    let paths = spec["paths"].as_object().unwrap();
    assert!(paths.contains_key("/v1/auth/register"));
    assert!(paths.contains_key("/v1/teams/{id}"));
    assert!(paths.contains_key("/v1/admin/export/teams.csv"));
    assert!(paths.contains_key("/v1/watch"));
}

#[tokio::test]
async fn test_metrics_endpoint_renders_gauges() {
    let app = test_app();
    // Generate one request so the counters are non-empty.
    let response = app.clone().oneshot(get("/v1/events", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("fest_events_total 0"));
    assert!(body.contains("fest_participants_total 0"));
}
