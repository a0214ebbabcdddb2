#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chatline_api::config::ServerConfig;
use chatline_api::router::build_app_router;
use chatline_api::state::{AppState, HealthCheck};
use chatline_auth::{AccountService, AuthComponents, AuthConfig, AuthService};
use chatline_chat::{ChatService, MessageService};
use chatline_core::hashing::Sha256TokenHasher;
use chatline_core::memory::{MemoryDatabase, MemorySessionCache};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_max_connections: 5,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        auth: AuthConfig::default(),
    }
}

struct AlwaysHealthy;

#[async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn database_healthy(&self) -> bool {
        true
    }

    async fn cache_healthy(&self) -> bool {
        true
    }
}

/// The application router plus handles on its in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub db: MemoryDatabase,
    pub cache: MemorySessionCache,
}

/// Build the full application with all middleware layers over in-memory
/// stores.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let db = MemoryDatabase::new();
    let cache = MemorySessionCache::new();

    let accounts = AccountService::new(Arc::new(db.clone()), config.auth.password_min_length);
    let components = AuthComponents {
        coordinator: db.clone(),
        sessions: db.clone(),
        history: db.clone(),
        cache: Arc::new(cache.clone()),
        verifier: Arc::new(accounts.clone()),
        issuer: Arc::new(config.auth.token_issuer()),
        hasher: Arc::new(Sha256TokenHasher),
    };
    let auth = AuthService::new(components, config.auth.clone());

    let state = AppState {
        auth: Arc::new(auth),
        accounts,
        chats: ChatService::new(Arc::new(db.clone()), Arc::new(db.clone())),
        messages: MessageService::new(Arc::new(db.clone()), Arc::new(db.clone())),
        health: Arc::new(AlwaysHealthy),
    };

    TestApp {
        router: build_app_router(state, &config),
        db,
        cache,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(
    app: &TestApp,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::put(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
