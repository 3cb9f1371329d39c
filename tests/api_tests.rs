// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Router tests: request in, status and JSON out.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{create_test_app, ScriptedTransport, TIREF};

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, json: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method("POST").uri(uri);
    match json {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app(ScriptedTransport::results_site());

    let response = send(&app.router, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

// ═══════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_validate_bad_format_is_answered_locally() {
    let app = create_test_app(ScriptedTransport::results_site());

    let response = send(
        &app.router,
        post("/api/validate", Some(serde_json::json!({ "tiref": "12" }))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["message"], "Invalid tiref format. Must be 4-8 digits.");
    assert_eq!(app.transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_validate_known_swimmer() {
    let app = create_test_app(ScriptedTransport::results_site());

    let response = send(
        &app.router,
        post("/api/validate", Some(serde_json::json!({ "tiref": TIREF }))),
    )
    .await;

    let json = json_body(response).await;
    assert_eq!(json["valid"], true);
    assert_eq!(json["tiref"], TIREF);
    assert_eq!(app.transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_validate_unreachable_site_reports_invalid() {
    let app = create_test_app(ScriptedTransport::unreachable());

    let response = send(
        &app.router,
        post("/api/validate", Some(serde_json::json!({ "tiref": TIREF }))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["message"], "Tiref not found on swimming results website");
}

#[tokio::test]
async fn test_invalid_identifier_is_400() {
    let app = create_test_app(ScriptedTransport::results_site());

    for uri in ["/api/swimmers/12a4", "/api/swimmers/123/records"] {
        let response = send(&app.router, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json_body(response).await["error"], "invalid_identifier");
    }

    let response = send(&app.router, post("/api/scrape/abcd", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.transport.calls(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// SWIMMER LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_unknown_swimmer_is_404() {
    let app = create_test_app(ScriptedTransport::results_site());

    let response = send(&app.router, get(&format!("/api/swimmers/{TIREF}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app.router,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/swimmers/{TIREF}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_scrape_then_read_back() {
    let app = create_test_app(ScriptedTransport::results_site());

    let response = send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["from_cache"], false);
    assert_eq!(json["records"].as_array().unwrap().len(), 5);

    let json = json_body(send(&app.router, get("/api/swimmers")).await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["swimmers"][0]["name"], "Khushi Rohit");

    let json = json_body(send(&app.router, get(&format!("/api/swimmers/{TIREF}/records?limit=2"))).await).await;
    assert_eq!(json["total_records"], 2);
    assert_eq!(json["tiref"], TIREF);

    let json = json_body(send(&app.router, get(&format!("/api/swimmers/{TIREF}/personal-bests"))).await).await;
    let bests = json["personal_bests"].as_array().unwrap();
    assert_eq!(bests.len(), 2);
    assert!(bests.iter().all(|b| b["estimated_points"].as_u64().unwrap() >= 1));

    let json = json_body(send(&app.router, get(&format!("/api/swimmers/{TIREF}/complete"))).await).await;
    assert_eq!(json["stats"]["total_races"], 5);

    let json = json_body(send(&app.router, get(&format!("/api/swimmers/{TIREF}/cache-info"))).await).await;
    assert_eq!(json["state"], "fresh");
    assert_eq!(json["is_fresh"], true);
    assert_eq!(json["records_count"], 5);

    let response = send(
        &app.router,
        post(&format!("/api/swimmers/{TIREF}/update-personal-bests"), None),
    )
    .await;
    assert_eq!(json_body(response).await["updated_count"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_personal_best_cards() {
    let app = create_test_app(ScriptedTransport::results_site());

    let response = send(&app.router, get(&format!("/api/swimmers/{TIREF}/personal-bests-cards"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;

    let response = send(&app.router, get(&format!("/api/swimmers/{TIREF}/personal-bests-cards"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["tiref"], TIREF);
    assert_eq!(json["swimmer_name"], "Khushi Rohit");

    let cards = json["personal_bests"].as_array().unwrap();
    let events: Vec<&str> = cards.iter().map(|c| c["event_name"].as_str().unwrap()).collect();
    assert_eq!(events, ["50 Freestyle", "100 Backstroke"]);
    for card in cards {
        assert!(card["improvement"]["trend"].is_string());
        assert!(card["total_races"].as_u64().unwrap() >= 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_scrape_serves_cache_until_refresh() {
    let app = create_test_app(ScriptedTransport::results_site());

    send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;
    let after_first = app.transport.calls();

    let json = json_body(send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await).await;
    assert_eq!(json["from_cache"], true);
    assert_eq!(app.transport.calls(), after_first);

    let json = json_body(
        send(&app.router, post(&format!("/api/scrape/{TIREF}?force_refresh=true"), None)).await,
    )
    .await;
    assert_eq!(json["from_cache"], false);

    let json = json_body(send(&app.router, post(&format!("/api/refresh/{TIREF}"), None)).await).await;
    assert_eq!(json["from_cache"], false);
    assert_eq!(app.transport.calls(), after_first * 3);
}

#[tokio::test(start_paused = true)]
async fn test_cache_info_goes_stale() {
    let app = create_test_app(ScriptedTransport::results_site());
    send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;

    app.clock.advance(chrono::Duration::hours(25));

    let json = json_body(send(&app.router, get(&format!("/api/swimmers/{TIREF}/cache-info"))).await).await;
    assert_eq!(json["state"], "stale");
    assert_eq!(json["ttl_hours"], 24);
}

#[tokio::test(start_paused = true)]
async fn test_delete_swimmer() {
    let app = create_test_app(ScriptedTransport::results_site());
    send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;

    let response = send(
        &app.router,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/swimmers/{TIREF}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], true);

    let response = send(&app.router, get(&format!("/api/swimmers/{TIREF}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.state.service.list_known_swimmers().await.unwrap().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_records_limit_zero_is_rejected() {
    let app = create_test_app(ScriptedTransport::results_site());
    send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;

    let response = send(&app.router, get(&format!("/api/swimmers/{TIREF}/records?limit=0"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_scrape_store_failure_is_500() {
    let app = create_test_app(ScriptedTransport::results_site());
    app.store.set_fail_writes(true);

    let response = send(&app.router, post(&format!("/api/scrape/{TIREF}"), None)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "database_error");
}
