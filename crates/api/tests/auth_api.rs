//! HTTP-level tests for registration, login, refresh and logout.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, get, get_auth, post_json, post_json_auth, send, TestApp};
use serde_json::json;
use uuid::Uuid;

const PASSWORD: &str = "correct-horse";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register(app: &TestApp, tag: &str) -> Uuid {
    let body = json!({
        "tag": tag,
        "name": "Test User",
        "email": format!("{tag}@example.com"),
        "password": PASSWORD,
    });
    let response = post_json(app, "/api/v1/user/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["id"].as_str().unwrap().parse().unwrap()
}

async fn login(app: &TestApp, tag: &str) -> (String, String) {
    let body = json!({ "tag": tag, "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok_with_request_id() {
    let app = build_test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

// ---------------------------------------------------------------------------
// Full session lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_login_refresh_logout() {
    let app = build_test_app();
    let user_id = register(&app, "alice").await;
    let (access, refresh) = login(&app, "alice").await;

    // Bearer access works on a protected route; contact details stay private.
    let response = get_auth(&app, "/api/v1/user/alice", &access).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["id"], user_id.to_string());
    assert!(profile.get("email").is_none());

    // Rotate.
    let response = post_json(&app, "/api/v1/auth/refresh", json!({ "refresh_token": refresh })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    let new_access = rotated["access_token"].as_str().unwrap().to_string();
    let new_refresh = rotated["refresh_token"].as_str().unwrap().to_string();

    // The retired refresh token is refused.
    let response = post_json(&app, "/api/v1/auth/refresh", json!({ "refresh_token": refresh })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_REFRESH_TOKEN");

    // Logout.
    let response = post_json_auth(
        &app,
        "/api/v1/auth/logout",
        json!({ "access_token": new_access, "refresh_token": new_refresh }),
        &new_access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(&app, "/api/v1/user/alice", &new_access).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        post_json(&app, "/api/v1/auth/refresh", json!({ "refresh_token": new_refresh })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // One login, two sessions in the chain.
    assert_eq!(app.db.login_records_for(user_id).len(), 1);
    assert_eq!(app.db.sessions_for(user_id).len(), 2);
}

#[tokio::test]
async fn login_records_forwarded_client_address() {
    let app = build_test_app();
    let user_id = register(&app, "bob").await;

    let request = Request::post("/api/v1/auth/login")
        .header("content-type", "application/json")
        .header("user-agent", "chatline-test/1.0")
        .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
        .body(Body::from(json!({ "email": "bob@example.com", "password": PASSWORD }).to_string()))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let records = app.db.login_records_for(user_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_agent, "chatline-test/1.0");
    assert_eq!(records[0].ip_address.as_deref(), Some("198.51.100.4"));
}

#[tokio::test]
async fn blank_identifiers_fall_through_to_tag() {
    let app = build_test_app();
    register(&app, "zed").await;

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({ "email": "", "phone": "", "tag": "zed", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["access_token"].is_string());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_must_name_the_bearer_session() {
    let app = build_test_app();
    register(&app, "heidi").await;
    let (mine, my_refresh) = login(&app, "heidi").await;
    let (other, other_refresh) = login(&app, "heidi").await;

    let response = post_json_auth(
        &app,
        "/api/v1/auth/logout",
        json!({ "access_token": other, "refresh_token": other_refresh }),
        &mine,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    // Neither session was touched.
    assert_eq!(get_auth(&app, "/api/v1/user/heidi", &mine).await.status(), StatusCode::OK);
    assert_eq!(get_auth(&app, "/api/v1/user/heidi", &other).await.status(), StatusCode::OK);

    let response = post_json_auth(
        &app,
        "/api/v1/auth/logout",
        json!({ "access_token": mine, "refresh_token": my_refresh }),
        &mine,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(get_auth(&app, "/api/v1/user/heidi", &other).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_failures() {
    let app = build_test_app();
    register(&app, "carol").await;

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({ "tag": "carol", "password": "wrong-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_CREDENTIALS");

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({ "tag": "nobody", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_CREDENTIALS");

    let response = post_json(&app, "/api/v1/auth/login", json!({ "password": PASSWORD })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_conflicts_and_validation() {
    let app = build_test_app();
    register(&app, "dave").await;

    let duplicate = json!({
        "tag": "dave",
        "name": "Other Dave",
        "email": "dave2@example.com",
        "password": PASSWORD,
    });
    let response = post_json(&app, "/api/v1/user/register", duplicate).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let no_contact = json!({ "tag": "erin", "name": "Erin", "password": PASSWORD });
    let response = post_json(&app, "/api/v1/user/register", no_contact).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = build_test_app();

    let response = get(&app, "/api/v1/user/anyone").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::get("/api/v1/user/anyone")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(&app, "/api/v1/user/anyone", "never-issued").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let app = build_test_app();
    register(&app, "frank").await;
    let (access, _) = login(&app, "frank").await;

    let response = get_auth(&app, "/api/v1/user/ghost", &access).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_refresh_token_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": "not-a-session-id.secret" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_SESSION");
}

#[tokio::test]
async fn cache_outage_surfaces_as_internal_error() {
    let app = build_test_app();
    register(&app, "grace").await;
    app.cache.set_unavailable(true);

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({ "tag": "grace", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "An internal error occurred");
}
