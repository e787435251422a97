//! Events fanned out to subscribed consumers

use serde::{Deserialize, Serialize};

use super::anomaly::Anomaly;
use super::metrics::FleetMetricSample;
use super::telemetry::VehicleState;

/// One of the three event kinds delivered to every live subscriber.
///
/// Emission order is preserved per kind; there is no guaranteed total
/// ordering across kinds. Serializes as `{"event": "...", "data": ...}`
/// for the websocket feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    VehicleStateChanged(VehicleState),
    AnomalyRaised(Anomaly),
    MetricsSampled(FleetMetricSample),
}

impl EngineEvent {
    /// Short name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EngineEvent::VehicleStateChanged(_) => "vehicle_state_changed",
            EngineEvent::AnomalyRaised(_) => "anomaly_raised",
            EngineEvent::MetricsSampled(_) => "metrics_sampled",
        }
    }
}
