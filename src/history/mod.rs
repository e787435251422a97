//! Track history — append-only per-vehicle position rings
//!
//! The in-memory counterpart of the external `location_tracking` table:
//! recent reports per vehicle, ordered by time, capped by a retention
//! count. Serves the recent-path and time-range query endpoints without
//! touching the durable sink.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::types::{PositionReport, VehicleId};

/// Per-vehicle bounded position history.
pub struct TrackHistory {
    inner: RwLock<HashMap<VehicleId, Vec<PositionReport>>>,
    retention_per_vehicle: usize,
}

impl TrackHistory {
    pub fn new(retention_per_vehicle: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            retention_per_vehicle,
        }
    }

    /// Append an accepted report. Reports arrive in per-vehicle timestamp
    /// order (stale ones never get here), so the ring stays sorted.
    pub fn append(&self, report: PositionReport) {
        let mut inner = self.write();
        let track = inner.entry(report.vehicle_id).or_default();
        if track.len() >= self.retention_per_vehicle {
            track.remove(0);
        }
        track.push(report);
    }

    /// Last `n` reports for a vehicle, oldest first.
    pub fn recent(&self, vehicle: VehicleId, n: usize) -> Vec<PositionReport> {
        self.read()
            .get(&vehicle)
            .map(|track| {
                let skip = track.len().saturating_sub(n);
                track[skip..].to_vec()
            })
            .unwrap_or_default()
    }

    /// Reports for a vehicle within `[from, to]`, oldest first.
    pub fn range(
        &self,
        vehicle: VehicleId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<PositionReport> {
        self.read()
            .get(&vehicle)
            .map(|track| {
                track
                    .iter()
                    .filter(|r| r.timestamp >= from && r.timestamp <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of retained reports for a vehicle.
    pub fn len(&self, vehicle: VehicleId) -> usize {
        self.read().get(&vehicle).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, vehicle: VehicleId) -> bool {
        self.len(vehicle) == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<VehicleId, Vec<PositionReport>>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<VehicleId, Vec<PositionReport>>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
