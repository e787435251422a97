//! Vehicle State Store — authoritative registry and live state
//!
//! The single piece of shared mutable state in the engine. All access goes
//! through the operations here; everything returned is a value copy, so no
//! caller can mutate shared state through a snapshot. A whole-store RwLock
//! is deliberate — fleets in the low thousands update at report cadence,
//! well inside what one lock sustains.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{IngestError, RegistryError};
use crate::geo::GeoPoint;
use crate::types::{PositionReport, Vehicle, VehicleId, VehicleState, VehicleStatus};

#[derive(Default)]
struct Registry {
    vehicles: HashMap<VehicleId, Vehicle>,
    states: HashMap<VehicleId, VehicleState>,
}

/// Authoritative map of registered vehicles and their latest state.
pub struct StateStore {
    inner: RwLock<Registry>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Registry::default()),
        }
    }

    /// Register a vehicle. Telemetry for an id is only accepted after this.
    pub fn register(&self, vehicle: Vehicle) -> Result<(), RegistryError> {
        let mut inner = self.write();
        if inner.vehicles.contains_key(&vehicle.id) {
            return Err(RegistryError::DuplicateVehicle(vehicle.id));
        }
        inner.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    /// Transition a vehicle's lifecycle status.
    ///
    /// Vehicles are never removed — decommissioning is a status change.
    /// The live state, if any, picks up the new status immediately.
    pub fn set_status(
        &self,
        id: VehicleId,
        status: VehicleStatus,
    ) -> Result<(), RegistryError> {
        let mut inner = self.write();
        let vehicle = inner
            .vehicles
            .get_mut(&id)
            .ok_or(RegistryError::UnknownVehicle(id))?;
        vehicle.status = status;
        if let Some(state) = inner.states.get_mut(&id) {
            state.status = status;
        }
        Ok(())
    }

    /// Apply an accepted report, returning the pre-mutation state and the
    /// new state.
    ///
    /// Unknown-vehicle and staleness checks happen here, under the write
    /// lock, so the monotonicity invariant holds under concurrent ingest.
    /// A rejected report leaves the store untouched.
    pub fn apply(
        &self,
        report: &PositionReport,
        smoothed: GeoPoint,
    ) -> Result<(Option<VehicleState>, VehicleState), IngestError> {
        let mut inner = self.write();

        let status = inner
            .vehicles
            .get(&report.vehicle_id)
            .map(|v| v.status)
            .ok_or(IngestError::UnknownVehicle(report.vehicle_id))?;

        let old = inner.states.get(&report.vehicle_id).cloned();
        if let Some(ref current) = old {
            if report.timestamp <= current.last_update {
                return Err(IngestError::StaleReport {
                    vehicle: report.vehicle_id,
                    reported: report.timestamp,
                    current: current.last_update,
                });
            }
        }

        let new = VehicleState {
            vehicle_id: report.vehicle_id,
            position: smoothed,
            raw_position: report.position(),
            speed_kmh: report.speed_kmh,
            heading_deg: report.heading_deg,
            // Carry the last known fuel level forward when a unit omits it
            fuel_level_pct: report
                .fuel_level_pct
                .or_else(|| old.as_ref().and_then(|s| s.fuel_level_pct)),
            status,
            last_update: report.timestamp,
        };
        inner.states.insert(report.vehicle_id, new.clone());

        Ok((old, new))
    }

    /// Latest state for one vehicle, if it has reported yet.
    pub fn get(&self, id: VehicleId) -> Option<VehicleState> {
        self.read().states.get(&id).cloned()
    }

    /// Registered vehicle record.
    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.read().vehicles.get(&id).cloned()
    }

    /// Value-copy snapshot of all live vehicle states.
    pub fn snapshot_all(&self) -> Vec<VehicleState> {
        let mut states: Vec<_> = self.read().states.values().cloned().collect();
        states.sort_by_key(|s| s.vehicle_id);
        states
    }

    /// Value-copy snapshot of the registry.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        let mut vehicles: Vec<_> = self.read().vehicles.values().cloned().collect();
        vehicles.sort_by_key(|v| v.id);
        vehicles
    }

    /// Count of registered vehicles with status `active`.
    ///
    /// Idle and maintenance vehicles still accept updates but are not
    /// part of the active fleet.
    pub fn active_count(&self) -> usize {
        self.read()
            .vehicles
            .values()
            .filter(|v| v.status == VehicleStatus::Active)
            .count()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
