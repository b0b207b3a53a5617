mod helpers;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use agora_api::build_app;

async fn get_json(state: &agora_api::AppState, uri: &str) -> (StatusCode, Value) {
    let response = build_app(state.clone())
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_registry_counts() {
    let state = helpers::test_state();
    let (a, _rx_a) = state.realtime.open_connection().unwrap();
    let (_b, _rx_b) = state.realtime.open_connection().unwrap();
    state.realtime.router.handle_join(a.id, "topic1").unwrap();

    let (status, body) = get_json(&state, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["connections"], 2);
    assert_eq!(body["data"]["rooms"], 1);
}

#[tokio::test]
async fn test_room_listing_and_members() {
    let state = helpers::test_state();
    let (a, _rx_a) = state.realtime.open_connection().unwrap();
    let (b, _rx_b) = state.realtime.open_connection().unwrap();
    let router = &state.realtime.router;
    router.handle_join(a.id, "topic1").unwrap();
    router.handle_join(b.id, "topic1").unwrap();
    router.handle_join(b.id, "topic2").unwrap();

    let (status, rooms) = get_json(&state, "/api/realtime/rooms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        rooms["data"],
        serde_json::json!([
            {"name": "topic1", "memberCount": 2},
            {"name": "topic2", "memberCount": 1},
        ])
    );

    let (status, members) = get_json(&state, "/api/realtime/rooms/topic2/members").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members["data"]["room"], "topic2");
    assert_eq!(members["data"]["members"], serde_json::json!([b.id]));

    let (_, connections) = get_json(&state, "/api/realtime/connections").await;
    let listed = connections["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    let entry_b = listed.iter().find(|c| c["id"] == serde_json::json!(b.id)).unwrap();
    assert_eq!(entry_b["rooms"], serde_json::json!(["topic1", "topic2"]));
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let state = helpers::test_state();

    let (status, body) = get_json(&state, "/api/realtime/rooms/nowhere/members").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_metrics_count_joins_and_rejections() {
    let state = helpers::test_state();
    let (a, _rx_a) = state.realtime.open_connection().unwrap();
    let router = &state.realtime.router;
    router.handle_join(a.id, "topic1").unwrap();
    let _ = router.handle_inbound(a.id, "not json");

    let (status, body) = get_json(&state, "/api/realtime/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connectionsActive"], 1);
    assert_eq!(body["data"]["joinsTotal"], 1);
    assert_eq!(body["data"]["messagesReceived"], 1);
    assert_eq!(body["data"]["errorsReported"], 1);
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let state = helpers::test_state();

    let response = build_app(state)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}
