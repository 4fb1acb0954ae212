//! Integration tests for hearth-sound API endpoints
//!
//! Tests cover:
//! - Health and mix listing
//! - Start / stop / fade / volume / timer controls
//! - Completion counter fed by the engine callback

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hearth_common::config::SoundscapeSettings;
use hearth_sound::api::{build_router, completion_counter, AppContext};
use hearth_sound::audio::SilentBackend;
use hearth_sound::{MixCatalog, SoundscapeEngine};
use serde_json::{json, Value};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: router over a silent engine
fn setup_app() -> axum::Router {
    let completed = Arc::new(AtomicU64::new(0));
    let engine = SoundscapeEngine::new(
        Arc::new(MixCatalog::builtin()),
        Arc::new(SilentBackend),
        0.8,
        Some(completion_counter(Arc::clone(&completed))),
    )
    .unwrap();
    build_router(AppContext::new(
        Arc::new(engine),
        completed,
        SoundscapeSettings::default(),
    ))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app();
    let (status, body) = send(&app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hearth-sound");
}

#[tokio::test]
async fn test_list_mixes() {
    let app = setup_app();
    let (status, body) = send(&app, get_request("/mixes")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["mixes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["focus", "reading", "calm-play", "bedtime"]);
    assert_eq!(body["mixes"][0]["layers"][0]["type"], "pink");
}

#[tokio::test]
async fn test_initial_state_is_idle() {
    let app = setup_app();
    let (_, body) = send(&app, get_request("/soundscape/state")).await;

    assert_eq!(body["status"], "idle");
    assert!(body["mix"].is_null());
    assert_eq!(body["layers"].as_array().unwrap().len(), 0);
    assert_eq!(body["completed"], 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_with_default_fade_in() {
    let app = setup_app();
    let (status, body) = send(&app, post_json("/soundscape/start", json!({ "mix_id": "focus" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "fading");
    assert_eq!(body["mix"], "focus");
    assert_eq!(body["layers"][0]["volume"], 0.0);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let (_, body) = send(&app, get_request("/soundscape/state")).await;
    assert_eq!(body["status"], "playing");
    let volume = body["layers"][0]["volume"].as_f64().unwrap();
    assert!((volume - 0.35 * 0.8).abs() < 1e-5, "got {}", volume);
}

#[tokio::test]
async fn test_start_without_fade() {
    let app = setup_app();
    let (_, body) = send(
        &app,
        post_json("/soundscape/start", json!({ "mix_id": "bedtime", "fade_in_ms": 0 })),
    )
    .await;

    assert_eq!(body["status"], "playing");
    assert_eq!(body["layers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_start_unknown_mix_is_404() {
    let app = setup_app();
    let (status, _) = send(&app, post_json("/soundscape/start", json!({ "mix_id": "nope" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, get_request("/soundscape/state")).await;
    assert_eq!(body["status"], "idle");
}

#[tokio::test]
async fn test_hard_stop_does_not_count_completion() {
    let app = setup_app();
    send(&app, post_json("/soundscape/start", json!({ "mix_id": "reading", "fade_in_ms": 0 }))).await;
    let (_, body) = send(&app, post_json("/soundscape/stop", json!({}))).await;

    assert_eq!(body["status"], "stopped");
    assert_eq!(body["layers"].as_array().unwrap().len(), 0);
    assert_eq!(body["completed"], 0);
}

#[tokio::test(start_paused = true)]
async fn test_faded_stop_counts_completion() {
    let app = setup_app();
    send(&app, post_json("/soundscape/start", json!({ "mix_id": "reading", "fade_in_ms": 0 }))).await;
    let (_, body) = send(&app, post_json("/soundscape/stop", json!({ "fade_out_ms": 200 }))).await;
    assert_eq!(body["status"], "fading");

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (_, body) = send(&app, get_request("/soundscape/state")).await;
    assert_eq!(body["status"], "stopped");
    assert_eq!(body["completed"], 1);
}

#[tokio::test]
async fn test_volume_is_clamped() {
    let app = setup_app();
    send(&app, post_json("/soundscape/start", json!({ "mix_id": "focus", "fade_in_ms": 0 }))).await;

    let (_, body) = send(&app, post_json("/soundscape/volume", json!({ "volume": 2.5 }))).await;
    assert_eq!(body["volume"], 1.0);
    let (_, body) = send(&app, post_json("/soundscape/volume", json!({ "volume": -0.5 }))).await;
    assert_eq!(body["volume"], 0.0);
    assert_eq!(body["layers"][0]["volume"], 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_timer_set_and_clear() {
    let app = setup_app();
    send(&app, post_json("/soundscape/start", json!({ "mix_id": "bedtime", "fade_in_ms": 0 }))).await;

    let (_, body) = send(&app, post_json("/soundscape/timer", json!({ "minutes": 15 }))).await;
    assert_eq!(body["timer_remaining_ms"], 15 * 60_000);

    let (_, body) = send(&app, post_json("/soundscape/timer", json!({ "minutes": 0 }))).await;
    assert!(body["timer_remaining_ms"].is_null());

    let (_, body) = send(&app, post_json("/soundscape/timer", json!({}))).await;
    assert!(body["timer_remaining_ms"].is_null());
}

#[tokio::test]
async fn test_fade_out_without_playback_is_noop() {
    let app = setup_app();
    let (status, body) = send(&app, post_json("/soundscape/fade-out", json!({ "ms": 500 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
    assert_eq!(body["fade_pending"], false);
}

#[tokio::test(start_paused = true)]
async fn test_fade_out_without_duration_uses_configured_default() {
    let app = setup_app();
    send(&app, post_json("/soundscape/start", json!({ "mix_id": "calm-play", "fade_in_ms": 0 }))).await;
    let (_, body) = send(&app, post_json("/soundscape/fade-out", json!({}))).await;
    assert_eq!(body["status"], "fading");

    // Default stop fade is one second
    tokio::time::sleep(Duration::from_millis(500)).await;
    let (_, body) = send(&app, get_request("/soundscape/state")).await;
    assert_eq!(body["status"], "fading");

    tokio::time::sleep(Duration::from_millis(600)).await;
    let (_, body) = send(&app, get_request("/soundscape/state")).await;
    assert_eq!(body["status"], "stopped");
    assert_eq!(body["completed"], 1);
}
