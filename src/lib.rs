//! fleetwatch: Fleet Operational Tracking Engine
//!
//! Near-real-time vehicle tracking, anomaly detection, and fleet
//! analytics.
//!
//! ## Architecture
//!
//! - **Ingest**: report validation and per-vehicle position smoothing
//! - **State Store**: single authoritative owner of live vehicle state
//! - **Rule Engine**: deterministic per-update anomaly checks
//! - **Alert Feed**: bounded, time-decaying alert collection
//! - **Aggregator**: scheduled fleet-metric sampling into a ring buffer
//! - **Distributor**: non-blocking event fan-out to subscribers

pub mod alerts;
pub mod analytics;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod geo;
pub mod history;
pub mod ingest;
pub mod predict;
pub mod rules;
pub mod state;
pub mod storage;
pub mod types;

// Re-export fleet configuration
pub use config::FleetConfig;

// Re-export commonly used types
pub use types::{
    Anomaly, AnomalyKind, AnomalyStatus, EngineEvent, FleetMetricSample, Hub, PositionReport,
    RouteCorridor, Severity, Vehicle, VehicleId, VehicleState, VehicleStatus, VehicleType,
};

// Re-export the engine surface
pub use engine::{BulkItemOutcome, EngineStats, FleetEngine, IngestReceipt, SchedulerHandle};

// Re-export errors
pub use error::{IngestError, RegistryError, SinkError};

// Re-export the geo primitives used across the API boundary
pub use geo::GeoPoint;

// Re-export storage seam
pub use storage::{InMemorySink, SinkWriter, TelemetrySink};
