//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};
use super::ws;

/// Build the v1 API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        // Telemetry ingest
        .route("/telemetry", post(handlers::ingest_telemetry))
        .route("/telemetry/bulk", post(handlers::ingest_bulk))
        .route("/telemetry/history/:id", get(handlers::telemetry_history))
        // Fleet registry (static routes before parameterized ones)
        .route("/vehicles", get(handlers::list_vehicles))
        .route("/vehicles", post(handlers::register_vehicle))
        .route("/vehicles/:id", get(handlers::vehicle_detail))
        .route("/vehicles/:id/status", post(handlers::set_vehicle_status))
        .route("/fleet/snapshot", get(handlers::fleet_snapshot))
        // Alerts
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/top", get(handlers::top_alerts))
        .route("/alerts/all", get(handlers::all_alerts))
        .route("/alerts/resolve", post(handlers::resolve_alert))
        .route("/alerts/report", post(handlers::report_anomaly))
        // Metrics
        .route("/metrics/recent", get(handlers::recent_metrics))
        // Predictions
        .route("/predictions/eta", post(handlers::predict_eta))
        // Engine counters
        .route("/status", get(handlers::status))
        .with_state(state)
}

/// Routes served outside the `/api/v1` prefix.
pub fn root_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws/tracking", get(ws::ws_tracking))
        .with_state(state)
}
