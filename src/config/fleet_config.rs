//! Fleet configuration - all engine tunables as operator-editable TOML values
//!
//! Every threshold and capacity the engine uses is a field here. Each
//! section implements `Default` with the values in
//! [`defaults`](super::defaults), so behavior is identical when no config
//! file is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::types::VehicleType;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a fleet deployment.
///
/// Load with `FleetConfig::load()` which searches:
/// 1. `$FLEETWATCH_CONFIG` env var
/// 2. `./fleet_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FleetConfig {
    /// Fleet identification
    #[serde(default)]
    pub fleet: FleetInfo,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-class speed limits
    #[serde(default)]
    pub speed_limits: SpeedLimitConfig,

    /// Anomaly rule thresholds
    #[serde(default)]
    pub rules: RuleConfig,

    /// Alert feed sizing
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Aggregator cadence and placeholder metric model
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Event distribution sizing
    #[serde(default)]
    pub events: EventsConfig,

    /// Ingest-side history and smoothing
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Durability sink queueing
    #[serde(default)]
    pub sink: SinkConfig,

    /// ETA prediction model
    #[serde(default)]
    pub predict: PredictConfig,
}

impl FleetConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FLEETWATCH_CONFIG` environment variable
    /// 2. `./fleet_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FLEETWATCH_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), fleet = %config.fleet.name, "Loaded fleet config from FLEETWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from FLEETWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "FLEETWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("fleet_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(fleet = %config.fleet.name, "Loaded fleet config from ./fleet_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./fleet_config.toml, using defaults");
                }
            }
        }

        info!("No fleet_config.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alerts.capacity == 0 {
            return Err(ConfigError::Invalid("alerts.capacity must be > 0".into()));
        }
        if self.analytics.window_capacity == 0 {
            return Err(ConfigError::Invalid(
                "analytics.window_capacity must be > 0".into(),
            ));
        }
        if self.analytics.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "analytics.tick_interval_ms must be > 0".into(),
            ));
        }
        if self.analytics.efficiency_min_pct >= self.analytics.efficiency_max_pct {
            return Err(ConfigError::Invalid(
                "analytics.efficiency_min_pct must be below efficiency_max_pct".into(),
            ));
        }
        if self.events.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(
                "events.subscriber_buffer must be > 0".into(),
            ));
        }
        if self.rules.corridor_width_km <= 0.0 {
            return Err(ConfigError::Invalid(
                "rules.corridor_width_km must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Sections
// ============================================================================

/// Fleet identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetInfo {
    #[serde(default = "FleetInfo::default_name")]
    pub name: String,
    #[serde(default)]
    pub region: String,
}

impl FleetInfo {
    fn default_name() -> String {
        "FLEET-001".to_string()
    }
}

impl Default for FleetInfo {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            region: String::new(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_addr")]
    pub addr: String,
}

impl ServerConfig {
    fn default_addr() -> String {
        defaults::SERVER_ADDR.to_string()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: Self::default_addr(),
        }
    }
}

/// Per-class speed limits (km/h)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedLimitConfig {
    #[serde(default = "SpeedLimitConfig::default_truck")]
    pub truck_kmh: f64,
    #[serde(default = "SpeedLimitConfig::default_van")]
    pub van_kmh: f64,
    #[serde(default = "SpeedLimitConfig::default_bus")]
    pub bus_kmh: f64,
    #[serde(default = "SpeedLimitConfig::default_car")]
    pub car_kmh: f64,
    #[serde(default = "SpeedLimitConfig::default_motorcycle")]
    pub motorcycle_kmh: f64,
}

impl SpeedLimitConfig {
    fn default_truck() -> f64 {
        defaults::SPEED_LIMIT_TRUCK_KMH
    }
    fn default_van() -> f64 {
        defaults::SPEED_LIMIT_VAN_KMH
    }
    fn default_bus() -> f64 {
        defaults::SPEED_LIMIT_BUS_KMH
    }
    fn default_car() -> f64 {
        defaults::SPEED_LIMIT_CAR_KMH
    }
    fn default_motorcycle() -> f64 {
        defaults::SPEED_LIMIT_MOTORCYCLE_KMH
    }

    /// Speed limit for a vehicle class (km/h).
    pub fn for_type(&self, vehicle_type: VehicleType) -> f64 {
        match vehicle_type {
            VehicleType::Truck => self.truck_kmh,
            VehicleType::Van => self.van_kmh,
            VehicleType::Bus => self.bus_kmh,
            VehicleType::Car => self.car_kmh,
            VehicleType::Motorcycle => self.motorcycle_kmh,
        }
    }
}

impl Default for SpeedLimitConfig {
    fn default() -> Self {
        Self {
            truck_kmh: Self::default_truck(),
            van_kmh: Self::default_van(),
            bus_kmh: Self::default_bus(),
            car_kmh: Self::default_car(),
            motorcycle_kmh: Self::default_motorcycle(),
        }
    }
}

/// Anomaly rule thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Excess ratio over the class limit escalating overspeed to high
    #[serde(default = "RuleConfig::default_overspeed_high_excess")]
    pub overspeed_high_excess_ratio: f64,
    /// Speed drop between consecutive reports treated as harsh braking (km/h)
    #[serde(default = "RuleConfig::default_brake_drop")]
    pub brake_drop_kmh: f64,
    /// Allowed lateral distance from an assigned route polyline (km)
    #[serde(default = "RuleConfig::default_corridor_width")]
    pub corridor_width_km: f64,
    /// Deviation escalates to high at this multiple of the corridor width
    #[serde(default = "RuleConfig::default_deviation_high_multiple")]
    pub deviation_high_multiple: f64,
    /// Fuel level below which a low-fuel anomaly fires (%)
    #[serde(default = "RuleConfig::default_low_fuel")]
    pub low_fuel_pct: f64,
}

impl RuleConfig {
    fn default_overspeed_high_excess() -> f64 {
        defaults::OVERSPEED_HIGH_EXCESS_RATIO
    }
    fn default_brake_drop() -> f64 {
        defaults::BRAKE_DROP_KMH
    }
    fn default_corridor_width() -> f64 {
        defaults::CORRIDOR_WIDTH_KM
    }
    fn default_deviation_high_multiple() -> f64 {
        defaults::DEVIATION_HIGH_MULTIPLE
    }
    fn default_low_fuel() -> f64 {
        defaults::LOW_FUEL_PCT
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            overspeed_high_excess_ratio: Self::default_overspeed_high_excess(),
            brake_drop_kmh: Self::default_brake_drop(),
            corridor_width_km: Self::default_corridor_width(),
            deviation_high_multiple: Self::default_deviation_high_multiple(),
            low_fuel_pct: Self::default_low_fuel(),
        }
    }
}

/// Alert feed sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "AlertConfig::default_capacity")]
    pub capacity: usize,
}

impl AlertConfig {
    fn default_capacity() -> usize {
        defaults::ALERT_FEED_CAPACITY
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

/// Aggregator cadence and the placeholder distance/fuel/efficiency model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "AnalyticsConfig::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "AnalyticsConfig::default_window_capacity")]
    pub window_capacity: usize,
    #[serde(default = "AnalyticsConfig::default_distance_per_tick")]
    pub distance_per_tick_km: f64,
    #[serde(default = "AnalyticsConfig::default_fuel_per_tick")]
    pub fuel_per_tick_l: f64,
    #[serde(default = "AnalyticsConfig::default_efficiency_baseline")]
    pub efficiency_baseline_pct: f64,
    #[serde(default = "AnalyticsConfig::default_efficiency_min")]
    pub efficiency_min_pct: f64,
    #[serde(default = "AnalyticsConfig::default_efficiency_max")]
    pub efficiency_max_pct: f64,
    #[serde(default = "AnalyticsConfig::default_efficiency_step")]
    pub efficiency_step_pct: f64,
}

impl AnalyticsConfig {
    fn default_tick_interval_ms() -> u64 {
        defaults::TICK_INTERVAL_MS
    }
    fn default_window_capacity() -> usize {
        defaults::METRICS_WINDOW_CAPACITY
    }
    fn default_distance_per_tick() -> f64 {
        defaults::DISTANCE_PER_TICK_KM
    }
    fn default_fuel_per_tick() -> f64 {
        defaults::FUEL_PER_TICK_L
    }
    fn default_efficiency_baseline() -> f64 {
        defaults::EFFICIENCY_BASELINE_PCT
    }
    fn default_efficiency_min() -> f64 {
        defaults::EFFICIENCY_MIN_PCT
    }
    fn default_efficiency_max() -> f64 {
        defaults::EFFICIENCY_MAX_PCT
    }
    fn default_efficiency_step() -> f64 {
        defaults::EFFICIENCY_STEP_PCT
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Self::default_tick_interval_ms(),
            window_capacity: Self::default_window_capacity(),
            distance_per_tick_km: Self::default_distance_per_tick(),
            fuel_per_tick_l: Self::default_fuel_per_tick(),
            efficiency_baseline_pct: Self::default_efficiency_baseline(),
            efficiency_min_pct: Self::default_efficiency_min(),
            efficiency_max_pct: Self::default_efficiency_max(),
            efficiency_step_pct: Self::default_efficiency_step(),
        }
    }
}

/// Event distribution sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events buffered per subscriber before it is dropped as too slow
    #[serde(default = "EventsConfig::default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl EventsConfig {
    fn default_subscriber_buffer() -> usize {
        defaults::SUBSCRIBER_BUFFER
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: Self::default_subscriber_buffer(),
        }
    }
}

/// Ingest-side history and smoothing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "IngestConfig::default_history_per_vehicle")]
    pub history_per_vehicle: usize,
    #[serde(default = "IngestConfig::default_process_noise")]
    pub smoothing_process_noise: f64,
    #[serde(default = "IngestConfig::default_measurement_noise")]
    pub smoothing_measurement_noise: f64,
}

impl IngestConfig {
    fn default_history_per_vehicle() -> usize {
        defaults::HISTORY_PER_VEHICLE
    }
    fn default_process_noise() -> f64 {
        defaults::SMOOTHING_PROCESS_NOISE
    }
    fn default_measurement_noise() -> f64 {
        defaults::SMOOTHING_MEASUREMENT_NOISE
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            history_per_vehicle: Self::default_history_per_vehicle(),
            smoothing_process_noise: Self::default_process_noise(),
            smoothing_measurement_noise: Self::default_measurement_noise(),
        }
    }
}

/// Durability sink queueing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "SinkConfig::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl SinkConfig {
    fn default_queue_capacity() -> usize {
        defaults::SINK_QUEUE_CAPACITY
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

/// ETA prediction model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "PredictConfig::default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "PredictConfig::default_base_speed")]
    pub base_speed_kmh: f64,
}

impl PredictConfig {
    fn default_cache_ttl() -> u64 {
        defaults::PREDICTION_TTL_SECS
    }
    fn default_base_speed() -> f64 {
        defaults::PREDICTION_BASE_SPEED_KMH
    }
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: Self::default_cache_ttl(),
            base_speed_kmh: Self::default_base_speed(),
        }
    }
}
