//! HTTP API tests
//!
//! Exercise the router end to end against the in-memory stores.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use roast_server::store::{InMemoryProfileStore, InMemoryRealtimeStore};
use roast_server::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    let state = AppState::new(
        Config::default(),
        Arc::new(InMemoryRealtimeStore::new()),
        Arc::new(InMemoryProfileStore::new()),
    );
    create_app(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn manual_settings() -> Value {
    json!({
        "targetTemperature": 180.0,
        "maxSafetyTemp": 220.0,
        "autoShutoffEnabled": true,
        "timerEnabled": false,
        "timerDuration": 5
    })
}

// ============================================================================
// Health and realtime
// ============================================================================

#[tokio::test]
async fn test_health_reports_stores() {
    let app = router();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["realtime"], "connected");
    assert_eq!(body["profiles"], "connected");
}

#[tokio::test]
async fn test_realtime_field_roundtrip_and_validation() {
    let app = router();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/realtime/temperature",
        Some(json!(151.5)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/v1/realtime/temperature", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(151.5));

    let (status, body) = send(&app, Method::PUT, "/api/v1/realtime/fanSpeed", Some(json!(3))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(&app, Method::PUT, "/api/v1/realtime/heater", Some(json!(1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ============================================================================
// Roast sessions
// ============================================================================

#[tokio::test]
async fn test_auto_start_rejected_while_manual_roast_runs() {
    let app = router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/roast/manual/start",
        Some(manual_settings()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRoasting"], true);

    let (status, body) = send(&app, Method::POST, "/api/v1/roast/auto/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, body) = send(&app, Method::GET, "/api/v1/notifications", None).await;
    let titles: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(titles.contains(&"Roasting Started".to_string()));
}

#[tokio::test]
async fn test_simultaneous_starts_admit_one_mode() {
    let app = router();
    let (status, _) = send(&app, Method::POST, "/api/v1/roast/auto/start", None).await;
    assert_eq!(status, StatusCode::OK);

    let ((manual, _), (auto, _)) = tokio::join!(
        send(
            &app,
            Method::POST,
            "/api/v1/roast/manual/start",
            Some(manual_settings()),
        ),
        send(
            &app,
            Method::POST,
            "/api/v1/roast/auto/preheat",
            Some(json!({ "preHeatTargetTemp": 180.0 })),
        ),
    );

    let mut statuses = vec![manual, auto];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
}

#[tokio::test]
async fn test_auto_session_errors_map_to_status_codes() {
    let app = router();

    let (status, body) = send(&app, Method::POST, "/api/v1/roast/auto/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modalType"], "preHeatEntry");
    assert_eq!(body["isModalOpen"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/roast/auto/preheat",
        Some(json!({ "preHeatTargetTemp": 250.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "pre_heat_target_temp");

    let (status, body) = send(&app, Method::POST, "/api/v1/roast/auto/beans-inserted", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/roast/auto/preheat",
        Some(json!({ "preHeatTargetTemp": 180.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "preheating");
    assert_eq!(body["preHeatTargetTemp"], 180.0);

    let (status, body) = send(&app, Method::POST, "/api/v1/roast/auto/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
}

// ============================================================================
// Profiles and dashboard
// ============================================================================

#[tokio::test]
async fn test_profile_crud_and_metrics() {
    let app = router();

    let (status, body) = send(&app, Method::GET, "/api/v1/dashboard/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/profiles",
        Some(json!({
            "name": "Kenya Nyeri",
            "roastLevel": "medium",
            "duration": 660,
            "targetTemperature": 185.0,
            "dropTemperature": 205.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/profiles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Kenya Nyeri");

    let (_, body) = send(&app, Method::GET, "/api/v1/profiles?search=nyeri", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, Method::GET, "/api/v1/profiles?roastLevel=dark", None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::GET, "/api/v1/dashboard/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profileSum"], 1);
    assert_eq!(body["recentProfile"], "Kenya Nyeri");
    assert_eq!(body["maxDropTemperature"], 205.0);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/profiles/{}", id),
        Some(json!({ "name": "Kenya Nyeri AA", "dropTemperature": 208.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Kenya Nyeri AA");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/profiles/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/profiles/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_profile_validation_errors() {
    let app = router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/profiles",
        Some(json!({ "name": "", "dropTemperature": 350.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["fields"].as_array().unwrap().len(), 2);
}
