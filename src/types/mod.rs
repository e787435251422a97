//! Shared data structures for the fleet tracking pipeline
//!
//! This module defines the core types for the tracking/alerting engine:
//! - Registry: Vehicle, Hub, RouteCorridor
//! - Telemetry: PositionReport (immutable), VehicleState (derived)
//! - Detection: Anomaly, AnomalyKind, Severity
//! - Analytics: FleetMetricSample
//! - Fan-out: EngineEvent

mod anomaly;
mod events;
mod metrics;
mod telemetry;
mod vehicle;

pub use anomaly::*;
pub use events::*;
pub use metrics::*;
pub use telemetry::*;
pub use vehicle::*;
