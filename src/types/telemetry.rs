//! Telemetry types: position reports and derived per-vehicle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vehicle::{VehicleId, VehicleStatus};
use crate::geo::GeoPoint;

/// A single position report from a vehicle, immutable once created.
///
/// Arrives over any transport (HTTP ingest, bulk feed, simulator).
/// Coordinates are WGS84. Raw values are preserved as reported; position
/// smoothing happens downstream and only affects the derived state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionReport {
    pub vehicle_id: VehicleId,
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed (km/h), non-negative
    pub speed_kmh: f64,
    /// Heading in degrees clockwise from north, [0, 360)
    #[serde(default)]
    pub heading_deg: Option<f64>,
    /// GPS horizontal accuracy estimate (m)
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    #[serde(default)]
    pub altitude_m: Option<f64>,
    /// Remaining fuel (percent of tank), when the unit reports it
    #[serde(default)]
    pub fuel_level_pct: Option<f64>,
    /// Driver distress flag — always raises a high-severity anomaly
    #[serde(default)]
    pub sos: bool,
    pub timestamp: DateTime<Utc>,
}

impl PositionReport {
    /// Raw reported position as a point.
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Latest known state of a vehicle, derived from accepted reports.
///
/// Exactly one per registered vehicle once its first report lands.
/// Owned exclusively by the state store and overwritten atomically on
/// each accepted report; everything handed out is a value copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    pub vehicle_id: VehicleId,
    /// Smoothed position used for rule evaluation and display
    pub position: GeoPoint,
    /// Raw reported position, kept alongside for audit
    pub raw_position: GeoPoint,
    pub speed_kmh: f64,
    pub heading_deg: Option<f64>,
    pub fuel_level_pct: Option<f64>,
    pub status: VehicleStatus,
    /// Timestamp of the report that produced this state.
    /// Monotonically non-decreasing per vehicle — stale reports are
    /// rejected before ever reaching here.
    pub last_update: DateTime<Utc>,
}
