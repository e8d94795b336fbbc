//! HTTP API tests against the in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use common::{invitation_at, qr_payload};
use serde_json::{Value, json};
use tower::ServiceExt;
use visitor_checkin_server::{
    app::{AppState, router},
    store::memory::MemoryStore,
};

const KIOSK_KEY: &str = "lobby-kiosk-test-key";

async fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.register_kiosk(KIOSK_KEY, "Main Gate").await;
    store
        .insert_invitation(invitation_at("inv1", 1, 0, Utc::now()))
        .await;
    store
        .insert_invitation(invitation_at("used-up", 1, 1, Utc::now()))
        .await;

    let state = AppState::from_store(store.clone(), Duration::from_secs(1));
    (router(state), store)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {KIOSK_KEY}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {KIOSK_KEY}"))
        .body(Body::empty())
        .unwrap()
}

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn kiosk_routes_require_a_known_key() {
    let (app, _) = test_app().await;

    let missing = Request::builder()
        .method("POST")
        .uri("/api/v1/check-in/scan")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "qr_data": qr_payload("inv1") }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/api/v1/visitors/00000000-0000-0000-0000-000000000000")
        .header("Authorization", "Bearer not-a-kiosk")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(parse_body(response).await["error"]["code"], "invalid_kiosk_key");
}

#[tokio::test]
async fn scan_returns_invitation_summary() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/check-in/scan",
            json!({ "qr_data": qr_payload("inv1") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_body(response).await;
    assert_eq!(body["id"], "inv1");
    assert_eq!(body["flat_no"], "B-402");
    assert_eq!(body["remaining_uses"], 1);
}

#[tokio::test]
async fn scan_errors_map_to_status_codes() {
    let (app, store) = test_app().await;

    let cases = [
        (r#"{"type":"other_thing"}"#.to_string(), StatusCode::BAD_REQUEST, "malformed_code"),
        (qr_payload("nope"), StatusCode::NOT_FOUND, "invitation_not_found"),
        (
            qr_payload("used-up"),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invitation_not_redeemable",
        ),
    ];

    for (qr_data, status, code) in cases {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/check-in/scan", json!({ "qr_data": qr_data })))
            .await
            .unwrap();
        assert_eq!(response.status(), status);
        assert_eq!(parse_body(response).await["error"]["code"], code);
    }

    assert_eq!(store.redeem_calls(), 0);
}

#[tokio::test]
async fn register_checks_in_visitor_once() {
    let (app, store) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/check-in/register",
            json!({ "invitation_id": "inv1", "name": "Ravi Kumar", "phone": "98450" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_body(response).await;
    assert_eq!(body["status"], "checked_in");
    assert_eq!(body["visiting_flat"], "B-402");
    assert_eq!(store.notification_attempts(), 2);

    let visitor_id = body["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/visitors/{visitor_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_body(response).await["name"], "Ravi Kumar");

    // Single-use invitation is now exhausted
    let response = app
        .oneshot(post_json(
            "/api/v1/check-in/register",
            json!({ "invitation_id": "inv1", "name": "Meena" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.visitors().await.len(), 1);
}

#[tokio::test]
async fn register_without_name_is_rejected() {
    let (app, store) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/check-in/register",
            json!({ "invitation_id": "inv1", "name": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(response).await;
    assert_eq!(body["error"]["code"], "missing_required_field");
    assert_eq!(body["error"]["message"], "Please enter visitor name");
    assert_eq!(store.invitation("inv1").await.unwrap().used_count, 0);
}

#[tokio::test]
async fn register_without_invitation_id_is_invalid() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/check-in/register",
            json!({ "invitation_id": " ", "name": "Ravi" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(response).await["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn unknown_visitor_is_not_found() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(get(&format!("/api/v1/visitors/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
