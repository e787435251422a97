//! Engine error taxonomy
//!
//! Ingest rejections are synchronous and carry a machine-readable reason
//! code; they are never silently dropped and never retried by the core.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::VehicleId;

/// Rejection reasons for a position report.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The vehicle was never registered. Registration must precede telemetry.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    /// Report timestamp is not newer than the vehicle's current state.
    /// Out-of-order reports are rejected, not merged.
    #[error("stale report for vehicle {vehicle}: {reported} <= {current}")]
    StaleReport {
        vehicle: VehicleId,
        reported: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// A physical value outside its valid range (lat, lon, speed).
    #[error("{field} out of range: {value}")]
    OutOfRangeValue { field: &'static str, value: f64 },
}

impl IngestError {
    /// Stable reason code for API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::UnknownVehicle(_) => "UNKNOWN_VEHICLE",
            IngestError::StaleReport { .. } => "STALE_REPORT",
            IngestError::OutOfRangeValue { .. } => "OUT_OF_RANGE_VALUE",
        }
    }
}

/// Fleet registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("vehicle {0} is already registered")]
    DuplicateVehicle(VehicleId),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),
}

/// Durability sink errors. Never propagated into the hot path — the
/// in-memory pipeline keeps serving even when the sink is unreachable.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("persistence unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(IngestError::UnknownVehicle(7).code(), "UNKNOWN_VEHICLE");
        assert_eq!(
            IngestError::OutOfRangeValue {
                field: "latitude",
                value: 91.0
            }
            .code(),
            "OUT_OF_RANGE_VALUE"
        );
    }
}
