//! Built-in defaults for every tunable in [`FleetConfig`](super::FleetConfig)
//!
//! These are the values used when no `fleet_config.toml` is present.

// === Alerting ===
/// Maximum entries in the alert feed before FIFO eviction
pub const ALERT_FEED_CAPACITY: usize = 20;

// === Analytics ===
/// Aggregator tick period (ms)
pub const TICK_INTERVAL_MS: u64 = 1000;
/// Metric ring buffer capacity (samples)
pub const METRICS_WINDOW_CAPACITY: usize = 10;
/// Modeled distance covered per active vehicle per tick (km)
pub const DISTANCE_PER_TICK_KM: f64 = 0.011;
/// Modeled fuel burned per active vehicle per tick (liters)
pub const FUEL_PER_TICK_L: f64 = 0.004;
/// Efficiency random-walk baseline (%)
pub const EFFICIENCY_BASELINE_PCT: f64 = 92.5;
/// Efficiency random-walk lower bound (%)
pub const EFFICIENCY_MIN_PCT: f64 = 90.0;
/// Efficiency random-walk upper bound (%)
pub const EFFICIENCY_MAX_PCT: f64 = 95.0;
/// Efficiency random-walk max step per tick (%)
pub const EFFICIENCY_STEP_PCT: f64 = 0.6;

// === Speed limits by vehicle class (km/h) ===
pub const SPEED_LIMIT_TRUCK_KMH: f64 = 90.0;
pub const SPEED_LIMIT_VAN_KMH: f64 = 100.0;
pub const SPEED_LIMIT_BUS_KMH: f64 = 80.0;
pub const SPEED_LIMIT_CAR_KMH: f64 = 120.0;
pub const SPEED_LIMIT_MOTORCYCLE_KMH: f64 = 110.0;

// === Anomaly rules ===
/// Excess over the class limit that escalates overspeed to high severity
pub const OVERSPEED_HIGH_EXCESS_RATIO: f64 = 0.20;
/// Speed drop between consecutive reports treated as harsh braking (km/h)
pub const BRAKE_DROP_KMH: f64 = 30.0;
/// Maximum report spacing for a speed drop to count as braking (s)
pub const BRAKE_MAX_INTERVAL_SECS: i64 = 10;
/// Allowed lateral distance from an assigned route polyline (km)
pub const CORRIDOR_WIDTH_KM: f64 = 0.5;
/// Cross-track distance that escalates route deviation to high severity,
/// as a multiple of the corridor width
pub const DEVIATION_HIGH_MULTIPLE: f64 = 2.0;
/// Fuel level below which a low-fuel anomaly fires (%)
pub const LOW_FUEL_PCT: f64 = 15.0;

// === Ingest ===
/// Per-vehicle in-memory track history ring capacity
pub const HISTORY_PER_VEHICLE: usize = 720;
/// Recent-track points returned in the vehicle detail response
pub const RECENT_TRACK_POINTS: usize = 10;
/// Kalman process noise for position smoothing
pub const SMOOTHING_PROCESS_NOISE: f64 = 0.001;
/// Kalman measurement noise for position smoothing
pub const SMOOTHING_MEASUREMENT_NOISE: f64 = 0.001;

// === Event distribution ===
/// Per-subscriber buffered events before the subscriber is dropped
pub const SUBSCRIBER_BUFFER: usize = 64;

// === Durability sink ===
/// Bounded queue depth between the hot path and the sink writer task
pub const SINK_QUEUE_CAPACITY: usize = 1024;

// === Predictions ===
/// ETA prediction cache validity window (seconds)
pub const PREDICTION_TTL_SECS: u64 = 600;
/// Fallback average speed when a vehicle is effectively stationary (km/h)
pub const PREDICTION_BASE_SPEED_KMH: f64 = 40.0;
/// ETA confidence for short hauls
pub const ETA_CONFIDENCE_NEAR: f64 = 0.92;
/// ETA confidence beyond the near-distance threshold
pub const ETA_CONFIDENCE_FAR: f64 = 0.75;
/// Distance boundary between near and far ETA confidence (km)
pub const ETA_NEAR_DISTANCE_KM: f64 = 50.0;

// === Server ===
/// Default HTTP bind address
pub const SERVER_ADDR: &str = "0.0.0.0:8080";
