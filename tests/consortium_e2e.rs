//! Consortium API end-to-end tests
//!
//! Clients, profit entries and allocations through the HTTP surface, backed
//! by an in-memory SQLite database.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{
    app, app_and_consortium, app_with_login_limit, consortium_admin_token, send, ADMIN, GUEST,
};

fn client(name: &str, invested: f64, join_date: &str) -> Value {
    json!({ "name": name, "invested": invested, "join_date": join_date })
}

fn gain_of(performance: &Value, client_id: &Value) -> f64 {
    performance
        .as_array()
        .unwrap()
        .iter()
        .find(|p| &p["client_id"] == client_id)
        .unwrap()["cumulative_gain"]
        .as_f64()
        .unwrap()
}

#[tokio::test]
async fn test_profit_is_split_by_invested_capital() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, a) = send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(ADMIN),
        Some(client("A", 100.0, "2024-01-01")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, b) = send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(ADMIN),
        Some(client("B", 300.0, "2024-01-01")),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/consortium/profits",
        Some(ADMIN),
        Some(json!({ "profit_date": "2024-01-02", "total_profit": 40.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, split) = send(
        &app,
        Method::GET,
        "/consortium/allocations/2024-01-02",
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let allocations = split["allocations"].as_array().unwrap();
    let allocated = |id: &Value| {
        allocations
            .iter()
            .find(|x| &x["client_id"] == id)
            .unwrap()["allocated"]
            .as_f64()
            .unwrap()
    };
    assert!((allocated(&a["id"]) - 10.0).abs() < 1e-9);
    assert!((allocated(&b["id"]) - 30.0).abs() < 1e-9);

    let (_, report) = send(&app, Method::GET, "/consortium/performance", Some(ADMIN), None).await;
    assert_eq!(report["summary"]["client_count"], 2);
    assert_eq!(report["summary"]["pool_value"], 440.0);
    assert!((gain_of(&report["performance"], &b["id"]) - 30.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_late_joiner_and_upsert() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(ADMIN),
        Some(client("Early", 100.0, "2024-01-01")),
    )
    .await;
    let (_, late) = send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(ADMIN),
        Some(client("Late", 100.0, "2024-02-01")),
    )
    .await;

    for total in [10.0, 25.0] {
        send(
            &app,
            Method::POST,
            "/consortium/profits",
            Some(ADMIN),
            Some(json!({ "profit_date": "2024-01-15", "total_profit": total })),
        )
        .await;
    }

    let (_, profits) = send(&app, Method::GET, "/consortium/profits", Some(ADMIN), None).await;
    let profits = profits.as_array().unwrap();
    assert_eq!(profits.len(), 1);
    assert_eq!(profits[0]["total_profit"], 25.0);

    let (_, report) = send(&app, Method::GET, "/consortium/performance", Some(ADMIN), None).await;
    assert_eq!(gain_of(&report["performance"], &late["id"]), 0.0);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/consortium/profits/2024-01-15",
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(
        &app,
        Method::GET,
        "/consortium/allocations/2024-01-15",
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_client_update_delete_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(ADMIN),
        Some(client("Neg", -1.0, "2024-01-01")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(ADMIN),
        Some(client("Gita", 50.0, "2024-01-01")),
    )
    .await;
    let uri = format!("/consortium/clients/{}", created["id"]);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(ADMIN),
        Some(client("Gita", 80.0, "2024-01-05")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["invested"], 80.0);
    assert_eq!(updated["join_date"], "2024-01-05");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cleared) =
        send(&app, Method::DELETE, "/consortium/clients", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["removed"], 0);
}

#[tokio::test]
async fn test_client_login_sees_own_performance() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let mut hana = client("Hana", 100.0, "2024-01-01");
    hana["password"] = json!("hana-secret");
    let (_, created) = send(&app, Method::POST, "/consortium/clients", Some(ADMIN), Some(hana)).await;
    assert!(created.get("password_hash").is_none());

    send(
        &app,
        Method::POST,
        "/consortium/profits",
        Some(ADMIN),
        Some(json!({ "profit_date": "2024-01-03", "total_profit": 12.0 })),
    )
    .await;

    let (status, perf) = send(
        &app,
        Method::POST,
        "/consortium/client-login",
        None,
        Some(json!({ "name": "Hana", "password": "hana-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(perf["client_id"], created["id"]);
    assert_eq!(perf["cumulative_gain"], 12.0);
    assert_eq!(perf["current_value"], 112.0);

    let (status, _) = send(
        &app,
        Method::POST,
        "/consortium/client-login",
        None,
        Some(json!({ "name": "Hana", "password": "guess" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guest_token_refused_on_consortium_routes() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    for (method, uri) in [
        (Method::GET, "/consortium/clients"),
        (Method::GET, "/consortium/profits"),
        (Method::GET, "/consortium/performance"),
        (Method::DELETE, "/consortium/profits"),
    ] {
        let (status, _) = send(&app, method, uri, Some(GUEST), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_login_attempts_are_rate_limited() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_login_limit(dir.path(), 2).await;

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({ "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "password": ADMIN })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_consortium_admin_session_reaches_consortium_routes_only() {
    let dir = tempfile::tempdir().unwrap();
    let (app, consortium) = app_and_consortium(dir.path(), 1000).await;
    let token = consortium_admin_token(&app, &consortium).await;

    let (status, clients) = send(&app, Method::GET, "/consortium/clients", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clients, json!([]));

    let (status, created) = send(
        &app,
        Method::POST,
        "/consortium/clients",
        Some(&token),
        Some(client("Ines", 100.0, "2024-01-01")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Ines");

    for uri in ["/journal/spot", "/journal/dashboard"] {
        let (status, _) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/consortium/admin-login",
        None,
        Some(json!({ "username": "boss", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_client_names_are_unique_ignoring_case() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let mut first = client("Dewi", 100.0, "2024-01-01");
    first["password"] = json!("first");
    let (status, created) =
        send(&app, Method::POST, "/consortium/clients", Some(ADMIN), Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = client("dewi", 50.0, "2024-01-01");
    second["password"] = json!("second");
    let (status, body) =
        send(&app, Method::POST, "/consortium/clients", Some(ADMIN), Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, perf) = send(
        &app,
        Method::POST,
        "/consortium/client-login",
        None,
        Some(json!({ "name": "dewi", "password": "first" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(perf["client_id"], created["id"]);
}
