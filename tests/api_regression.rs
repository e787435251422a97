//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and
//! exercise the /api/v1/* endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use fleetwatch::api::{create_app, ApiState};
use fleetwatch::config::{self, FleetConfig};
use fleetwatch::engine::FleetEngine;
use fleetwatch::storage::{InMemorySink, SinkWriter};

fn ensure_config() {
    if !config::is_initialized() {
        config::init(FleetConfig::default());
    }
}

fn test_state() -> ApiState {
    ensure_config();
    let cancel = CancellationToken::new();
    let (writer, _task) = SinkWriter::spawn(Arc::new(InMemorySink::new()), 64, cancel);
    ApiState::new(Arc::new(FleetEngine::new(&FleetConfig::default(), writer)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "number": format!("IND-MU-{id}"),
        "vehicle_type": "truck",
    })
}

fn telemetry_body(id: u64, speed: f64) -> serde_json::Value {
    serde_json::json!({
        "vehicle_id": id,
        "latitude": 19.0760,
        "longitude": 72.8777,
        "speed_kmh": speed,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

#[tokio::test]
async fn test_get_endpoints_return_200_on_empty_engine() {
    let endpoints = [
        "/health",
        "/api/v1/vehicles",
        "/api/v1/fleet/snapshot",
        "/api/v1/alerts",
        "/api/v1/alerts/top",
        "/api/v1/alerts/all",
        "/api/v1/metrics/recent",
        "/api/v1/status",
    ];
    for endpoint in &endpoints {
        let app = create_app(test_state());
        let resp = app.oneshot(get(endpoint)).await.unwrap();
        assert!(
            resp.status().is_success(),
            "GET {endpoint} returned {}",
            resp.status()
        );
    }
}

#[tokio::test]
async fn test_register_then_ingest_roundtrip() {
    let state = test_state();

    let resp = create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = create_app(state.clone())
        .oneshot(post_json("/api/v1/telemetry", telemetry_body(1, 45.0)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["vehicle_id"], 1);
    assert_eq!(v["data"]["anomalies_raised"], 0);

    // The snapshot now carries the vehicle
    let resp = create_app(state)
        .oneshot(get("/api/v1/vehicles/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["current_state"]["speed_kmh"], 45.0);
    assert_eq!(v["data"]["recent_path"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ingest_unknown_vehicle_is_404_with_code() {
    let resp = create_app(test_state())
        .oneshot(post_json("/api/v1/telemetry", telemetry_body(777, 45.0)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "UNKNOWN_VEHICLE");
}

#[tokio::test]
async fn test_ingest_out_of_range_is_422_with_code() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();

    let mut body = telemetry_body(1, 45.0);
    body["latitude"] = serde_json::json!(95.0);
    let resp = create_app(state)
        .oneshot(post_json("/api/v1/telemetry", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "OUT_OF_RANGE_VALUE");
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();
    let resp = create_app(state)
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_overspeed_shows_in_alert_feed() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/telemetry", telemetry_body(1, 130.0)))
        .await
        .unwrap();

    let resp = create_app(state.clone())
        .oneshot(get("/api/v1/alerts/top?n=3"))
        .await
        .unwrap();
    let v = body_json(resp).await;
    let alerts = v["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["kind"], "overspeed");
    assert_eq!(alerts[0]["severity"], "high");
    assert_eq!(alerts[0]["age"], "just now");

    // Explicit resolution clears the active list
    let resp = create_app(state.clone())
        .oneshot(post_json(
            "/api/v1/alerts/resolve",
            serde_json::json!({"vehicle_id": 1, "kind": "overspeed"}),
        ))
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v["data"]["resolved"], 1);

    let resp = create_app(state)
        .oneshot(get("/api/v1/alerts"))
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert!(v["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_ingest_reports_per_item_outcomes() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();

    let body = serde_json::json!({
        "data": [telemetry_body(1, 40.0), telemetry_body(9, 40.0)],
    });
    let resp = create_app(state)
        .oneshot(post_json("/api/v1/telemetry/bulk", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["ingested_count"], 1);
    assert_eq!(v["data"]["total_records"], 2);
    assert_eq!(v["data"]["outcomes"][1]["reason"], "UNKNOWN_VEHICLE");
}

#[tokio::test]
async fn test_eta_prediction_requires_known_position() {
    let state = test_state();
    let eta_request = serde_json::json!({
        "vehicle_id": 1,
        "destination_lat": 18.5204,
        "destination_lon": 73.8567,
    });

    // No position yet: 404
    let resp = create_app(state.clone())
        .oneshot(post_json("/api/v1/predictions/eta", eta_request.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/telemetry", telemetry_body(1, 60.0)))
        .await
        .unwrap();

    let resp = create_app(state)
        .oneshot(post_json("/api/v1/predictions/eta", eta_request))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert!(v["data"]["distance_km"].as_f64().unwrap() > 100.0);
    assert!(v["data"]["predicted_minutes"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_vehicle_status_transition() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();

    let resp = create_app(state.clone())
        .oneshot(post_json(
            "/api/v1/vehicles/1/status",
            serde_json::json!({"status": "maintenance"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = create_app(state)
        .oneshot(get("/api/v1/vehicles/1"))
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v["data"]["status"], "maintenance");
}

#[tokio::test]
async fn test_manual_anomaly_report() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();

    let resp = create_app(state.clone())
        .oneshot(post_json(
            "/api/v1/alerts/report",
            serde_json::json!({
                "vehicle_id": 1,
                "kind": "maintenance_due",
                "severity": "low",
                "description": "brake pads at 10%",
                "latitude": 19.0760,
                "longitude": 72.8777,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = create_app(state)
        .oneshot(get("/api/v1/alerts"))
        .await
        .unwrap();
    let v = body_json(resp).await;
    assert_eq!(v["data"][0]["kind"], "maintenance_due");
}

#[tokio::test]
async fn test_history_endpoint_returns_range() {
    let state = test_state();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/vehicles", register_body(1)))
        .await
        .unwrap();
    create_app(state.clone())
        .oneshot(post_json("/api/v1/telemetry", telemetry_body(1, 40.0)))
        .await
        .unwrap();

    let resp = create_app(state)
        .oneshot(get("/api/v1/telemetry/history/1?minutes=5"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["count"], 1);
}
