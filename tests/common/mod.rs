//! Shared setup for the HTTP end-to-end tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use zeroize::Zeroizing;

use tradebook::application::services::consortium_service::ConsortiumService;
use tradebook::application::services::journal_service::JournalService;
use tradebook::application::state::{build_router, AppState};
use tradebook::auth::{Authenticator, Credentials, SessionIssuer};
use tradebook::persistence::json_store::JsonStore;
use tradebook::persistence::{init_database, DatabaseConfig};
use tradebook::rate_limit::{create_rate_limiter, RateLimiterConfig};

pub const ADMIN: &str = "admin-pw";
pub const GUEST: &str = "guest-pw";

pub const CONSORTIUM_ADMIN: &str = "boss";
pub const CONSORTIUM_ADMIN_PASSWORD: &str = "boss-secret-pw";

/// Router plus the consortium service behind it, for seeding.
pub async fn app_and_consortium(
    data_dir: &Path,
    logins_per_minute: u32,
) -> (Router, ConsortiumService) {
    let pool = init_database(&DatabaseConfig::in_memory()).await.unwrap();
    let consortium = ConsortiumService::new(pool);
    let state = AppState {
        journal: Arc::new(JournalService::new(JsonStore::new(data_dir))),
        consortium: consortium.clone(),
        auth: Authenticator::new(
            Credentials::new(
                Zeroizing::new(ADMIN.to_string()),
                Zeroizing::new(GUEST.to_string()),
            ),
            SessionIssuer::new(b"e2e-session-secret", Duration::from_secs(600)),
        ),
        login_limiter: create_rate_limiter(RateLimiterConfig {
            requests_per_minute: logins_per_minute,
        }),
    };
    (build_router(state, 64 * 1024), consortium)
}

pub async fn app_with_login_limit(data_dir: &Path, logins_per_minute: u32) -> Router {
    app_and_consortium(data_dir, logins_per_minute).await.0
}

pub async fn app(data_dir: &Path) -> Router {
    app_with_login_limit(data_dir, 1000).await
}

/// Seed the consortium admin and log in, returning the session token.
pub async fn consortium_admin_token(app: &Router, consortium: &ConsortiumService) -> String {
    consortium
        .ensure_admin(CONSORTIUM_ADMIN, CONSORTIUM_ADMIN_PASSWORD)
        .await
        .unwrap();
    let (status, body) = send(
        app,
        Method::POST,
        "/consortium/admin-login",
        None,
        Some(serde_json::json!({
            "username": CONSORTIUM_ADMIN,
            "password": CONSORTIUM_ADMIN_PASSWORD
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

/// Send a request with a raw body, for payloads that are not valid JSON.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    decode(app.clone().oneshot(request).await.unwrap()).await
}

async fn decode(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Send one request and decode the JSON body (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    decode(app.clone().oneshot(request).await.unwrap()).await
}
