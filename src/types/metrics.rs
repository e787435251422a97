//! Fleet-level aggregate metric samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregator tick's worth of fleet-level metrics.
///
/// Produced on a fixed cadence and held in a fixed-capacity ring buffer,
/// most-recent-last. Distance and fuel use a per-tick placeholder model
/// until a real telemetry feed replaces the estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetMetricSample {
    pub timestamp: DateTime<Utc>,
    /// Vehicles with status `active` in the store snapshot at this tick
    pub active_vehicles: usize,
    /// Anomalies detected since the previous tick
    pub anomalies_in_window: u64,
    /// Distance covered by the fleet during this tick (km)
    pub distance_km_delta: f64,
    /// Fuel consumed by the fleet during this tick (liters)
    pub fuel_l_delta: f64,
    /// Running fleet distance since engine start (km)
    pub total_distance_km: f64,
    /// Running fleet fuel since engine start (liters)
    pub total_fuel_l: f64,
    /// Modeled fleet efficiency (percent, bounded random walk placeholder)
    pub efficiency_pct: f64,
}
