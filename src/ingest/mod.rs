//! Position report validation and normalization
//!
//! The ingest boundary accepts reports from any transport (HTTP, bulk
//! feed, simulator) and rejects physically impossible values before they
//! reach the state store. Rejections are synchronous, carry a reason code,
//! and are never retried by the core — retry policy belongs to callers.

pub mod smoothing;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::IngestError;
use crate::geo::GeoPoint;
use crate::types::{PositionReport, VehicleId};

use smoothing::PositionFilter;

/// Validate physical bounds on a report.
///
/// Staleness and vehicle existence are checked later, under the state
/// store's write lock, where they can be decided atomically.
pub fn validate(report: &PositionReport) -> Result<(), IngestError> {
    if !(-90.0..=90.0).contains(&report.latitude) || !report.latitude.is_finite() {
        return Err(IngestError::OutOfRangeValue {
            field: "latitude",
            value: report.latitude,
        });
    }
    if !(-180.0..=180.0).contains(&report.longitude) || !report.longitude.is_finite() {
        return Err(IngestError::OutOfRangeValue {
            field: "longitude",
            value: report.longitude,
        });
    }
    if report.speed_kmh < 0.0 || !report.speed_kmh.is_finite() {
        return Err(IngestError::OutOfRangeValue {
            field: "speed_kmh",
            value: report.speed_kmh,
        });
    }
    if let Some(heading) = report.heading_deg {
        if !(0.0..360.0).contains(&heading) {
            return Err(IngestError::OutOfRangeValue {
                field: "heading_deg",
                value: heading,
            });
        }
    }
    if let Some(fuel) = report.fuel_level_pct {
        if !(0.0..=100.0).contains(&fuel) {
            return Err(IngestError::OutOfRangeValue {
                field: "fuel_level_pct",
                value: fuel,
            });
        }
    }
    Ok(())
}

/// Per-vehicle smoothing filters, lazily created on first report.
///
/// Filters live for the engine's lifetime; a few hundred bytes per vehicle
/// at expected fleet scales.
pub struct SmootherBank {
    filters: Mutex<HashMap<VehicleId, PositionFilter>>,
    process_noise: f64,
    measurement_noise: f64,
}

impl SmootherBank {
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            filters: Mutex::new(HashMap::new()),
            process_noise,
            measurement_noise,
        }
    }

    /// Smooth a raw fix through the vehicle's filter.
    pub fn smooth(&self, vehicle_id: VehicleId, raw: GeoPoint) -> GeoPoint {
        let mut filters = match self.filters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        filters
            .entry(vehicle_id)
            .or_insert_with(|| PositionFilter::new(self.process_noise, self.measurement_noise))
            .process(raw)
    }
}
