//! API route handlers
//!
//! Request handling for the external interfaces: telemetry ingest (single
//! and bulk), fleet registry, state snapshots, alerts, metrics, ETA
//! predictions, and track history queries.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::{manual_anomaly, FleetEngine};
use crate::geo::GeoPoint;
use crate::types::{
    Anomaly, AnomalyKind, PositionReport, Severity, Vehicle, VehicleId, VehicleState,
    VehicleStatus, VehicleType,
};

use super::envelope::{ApiErrorResponse, ApiResponse};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<FleetEngine>,
}

impl ApiState {
    pub fn new(engine: Arc<FleetEngine>) -> Self {
        Self { engine }
    }
}

// ============================================================================
// Health & Status
// ============================================================================

/// Liveness probe. Flat shape, no envelope — monitors poll this.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Engine counters for operators.
pub async fn status(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.engine.stats())
}

// ============================================================================
// Telemetry Ingest
// ============================================================================

#[derive(Serialize)]
struct IngestAccepted {
    vehicle_id: VehicleId,
    timestamp: String,
    anomalies_raised: usize,
}

/// `POST /telemetry` — ingest one position report.
pub async fn ingest_telemetry(
    State(state): State<ApiState>,
    Json(report): Json<PositionReport>,
) -> Response {
    match state.engine.ingest(report) {
        Ok(receipt) => ApiResponse::created(IngestAccepted {
            vehicle_id: receipt.state.vehicle_id,
            timestamp: receipt.state.last_update.to_rfc3339(),
            anomalies_raised: receipt.anomalies.len(),
        }),
        Err(e) => ApiErrorResponse::from_rejection(&e),
    }
}

#[derive(Deserialize)]
pub struct BulkIngestRequest {
    pub data: Vec<PositionReport>,
}

#[derive(Serialize)]
struct BulkIngestResponse {
    ingested_count: usize,
    total_records: usize,
    outcomes: Vec<crate::engine::BulkItemOutcome>,
}

/// `POST /telemetry/bulk` — batch ingest with per-item outcomes.
pub async fn ingest_bulk(
    State(state): State<ApiState>,
    Json(request): Json<BulkIngestRequest>,
) -> Response {
    let total = request.data.len();
    let outcomes = state.engine.ingest_bulk(request.data);
    let accepted = outcomes.iter().filter(|o| o.accepted).count();
    ApiResponse::created(BulkIngestResponse {
        ingested_count: accepted,
        total_records: total,
        outcomes,
    })
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    /// Look-back window in minutes
    #[serde(default = "HistoryQuery::default_minutes")]
    pub minutes: i64,
}

impl HistoryQuery {
    fn default_minutes() -> i64 {
        60
    }
}

#[derive(Serialize)]
struct HistoryResponse {
    vehicle_id: VehicleId,
    minutes: i64,
    count: usize,
    reports: Vec<PositionReport>,
}

/// `GET /telemetry/history/:id` — time-range track query.
pub async fn telemetry_history(
    State(state): State<ApiState>,
    Path(id): Path<VehicleId>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if state.engine.vehicle(id).is_none() {
        return ApiErrorResponse::not_found(format!("vehicle {id} not found"));
    }
    let to = Utc::now();
    let from = to - Duration::minutes(query.minutes.max(0));
    let reports = state.engine.track_range(id, from, to);
    ApiResponse::ok(HistoryResponse {
        vehicle_id: id,
        minutes: query.minutes,
        count: reports.len(),
        reports,
    })
}

// ============================================================================
// Fleet Registry
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterVehicleRequest {
    pub id: VehicleId,
    pub number: String,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub hub: Option<crate::types::Hub>,
    #[serde(default)]
    pub route: Option<crate::types::RouteCorridor>,
    #[serde(default)]
    pub owner_id: Option<u64>,
}

/// `POST /vehicles` — register a vehicle before any telemetry.
pub async fn register_vehicle(
    State(state): State<ApiState>,
    Json(request): Json<RegisterVehicleRequest>,
) -> Response {
    let vehicle = Vehicle {
        id: request.id,
        number: request.number,
        vehicle_type: request.vehicle_type,
        hub: request.hub,
        route: request.route,
        owner_id: request.owner_id,
        status: VehicleStatus::Active,
        registered_at: Utc::now(),
    };
    match state.engine.register_vehicle(vehicle.clone()) {
        Ok(()) => ApiResponse::created(vehicle),
        Err(e) => ApiErrorResponse::from_registry(&e),
    }
}

#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub status: VehicleStatus,
}

/// `POST /vehicles/:id/status` — lifecycle transition.
pub async fn set_vehicle_status(
    State(state): State<ApiState>,
    Path(id): Path<VehicleId>,
    Json(request): Json<StatusChangeRequest>,
) -> Response {
    match state.engine.set_vehicle_status(id, request.status) {
        Ok(()) => ApiResponse::ok(serde_json::json!({
            "vehicle_id": id,
            "status": request.status,
        })),
        Err(e) => ApiErrorResponse::from_registry(&e),
    }
}

#[derive(Serialize)]
struct VehicleSummary {
    #[serde(flatten)]
    vehicle: Vehicle,
    latest_state: Option<VehicleState>,
}

/// `GET /vehicles` — registry with latest states.
pub async fn list_vehicles(State(state): State<ApiState>) -> Response {
    let summaries: Vec<_> = state
        .engine
        .vehicles()
        .into_iter()
        .map(|vehicle| {
            let latest_state = state.engine.vehicle_state(vehicle.id);
            VehicleSummary {
                vehicle,
                latest_state,
            }
        })
        .collect();
    ApiResponse::ok(summaries)
}

#[derive(Serialize)]
struct VehicleDetail {
    #[serde(flatten)]
    vehicle: Vehicle,
    current_state: Option<VehicleState>,
    recent_path: Vec<PositionReport>,
}

/// `GET /vehicles/:id` — vehicle detail with its recent track.
pub async fn vehicle_detail(
    State(state): State<ApiState>,
    Path(id): Path<VehicleId>,
) -> Response {
    let Some(vehicle) = state.engine.vehicle(id) else {
        return ApiErrorResponse::not_found(format!("vehicle {id} not found"));
    };
    let current_state = state.engine.vehicle_state(id);
    let recent_path = state
        .engine
        .recent_track(id, crate::config::defaults::RECENT_TRACK_POINTS);
    ApiResponse::ok(VehicleDetail {
        vehicle,
        current_state,
        recent_path,
    })
}

/// `GET /fleet/snapshot` — value-copy snapshot of all live states.
pub async fn fleet_snapshot(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.engine.snapshot())
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Deserialize)]
pub struct TopQuery {
    #[serde(default = "TopQuery::default_n")]
    pub n: usize,
}

impl TopQuery {
    fn default_n() -> usize {
        5
    }
}

/// `GET /alerts` — all active alerts in insertion order.
pub async fn list_alerts(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.engine.alerts_active())
}

/// `GET /alerts/top` — most severe, most recent first.
pub async fn top_alerts(State(state): State<ApiState>, Query(query): Query<TopQuery>) -> Response {
    ApiResponse::ok(state.engine.alerts_top(query.n))
}

/// `GET /alerts/all` — active plus recently resolved.
pub async fn all_alerts(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.engine.alerts_all())
}

#[derive(Deserialize)]
pub struct ResolveAlertRequest {
    pub vehicle_id: VehicleId,
    pub kind: AnomalyKind,
}

/// `POST /alerts/resolve` — explicitly resolve active (vehicle, kind) alerts.
pub async fn resolve_alert(
    State(state): State<ApiState>,
    Json(request): Json<ResolveAlertRequest>,
) -> Response {
    let resolved = state.engine.resolve_alert(request.vehicle_id, request.kind);
    ApiResponse::ok(serde_json::json!({
        "vehicle_id": request.vehicle_id,
        "kind": request.kind,
        "resolved": resolved,
    }))
}

#[derive(Deserialize)]
pub struct ReportAnomalyRequest {
    pub vehicle_id: VehicleId,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// `POST /alerts/report` — manually report an anomaly (operator or an
/// external detector feeding the same pipeline).
pub async fn report_anomaly(
    State(state): State<ApiState>,
    Json(request): Json<ReportAnomalyRequest>,
) -> Response {
    if state.engine.vehicle(request.vehicle_id).is_none() {
        return ApiErrorResponse::not_found(format!("vehicle {} not found", request.vehicle_id));
    }
    let anomaly: Anomaly = manual_anomaly(
        request.vehicle_id,
        request.kind,
        request.severity,
        request.description,
        GeoPoint::new(request.latitude, request.longitude),
    );
    state.engine.raise(anomaly.clone());
    ApiResponse::created(anomaly)
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Deserialize)]
pub struct RecentQuery {
    #[serde(default = "RecentQuery::default_n")]
    pub n: usize,
}

impl RecentQuery {
    fn default_n() -> usize {
        10
    }
}

/// `GET /metrics/recent` — most recent N samples, oldest first.
pub async fn recent_metrics(
    State(state): State<ApiState>,
    Query(query): Query<RecentQuery>,
) -> Response {
    ApiResponse::ok(state.engine.metrics_recent(query.n))
}

// ============================================================================
// Predictions
// ============================================================================

#[derive(Deserialize)]
pub struct EtaRequest {
    pub vehicle_id: VehicleId,
    pub destination_lat: f64,
    pub destination_lon: f64,
}

/// `POST /predictions/eta` — cached ETA prediction.
pub async fn predict_eta(
    State(state): State<ApiState>,
    Json(request): Json<EtaRequest>,
) -> Response {
    if !(-90.0..=90.0).contains(&request.destination_lat)
        || !(-180.0..=180.0).contains(&request.destination_lon)
    {
        return ApiErrorResponse::bad_request("destination out of range");
    }
    let destination = GeoPoint::new(request.destination_lat, request.destination_lon);
    match state.engine.predict_eta(request.vehicle_id, destination) {
        Some(prediction) => ApiResponse::ok(prediction),
        None => ApiErrorResponse::not_found(format!(
            "vehicle {} position unknown",
            request.vehicle_id
        )),
    }
}
