//! Fleet registry types: vehicles, hubs, and assigned route corridors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Vehicle identifier. Matches the integer primary key of the external
/// `vehicles` table.
pub type VehicleId = u64;

/// Vehicle class, used to look up the applicable speed limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Truck,
    Van,
    Bus,
    Car,
    Motorcycle,
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleType::Truck => write!(f, "truck"),
            VehicleType::Van => write!(f, "van"),
            VehicleType::Bus => write!(f, "bus"),
            VehicleType::Car => write!(f, "car"),
            VehicleType::Motorcycle => write!(f, "motorcycle"),
        }
    }
}

/// Lifecycle status of a registered vehicle.
///
/// Vehicles are never deleted — a decommissioned vehicle is moved to
/// `Maintenance` or left `Idle`. Idle vehicles still accept position
/// updates but are excluded from the active fleet count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Active,
    Idle,
    Maintenance,
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleStatus::Active => write!(f, "active"),
            VehicleStatus::Idle => write!(f, "idle"),
            VehicleStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// A named geographic cluster with a permitted operating radius.
///
/// Hubs anchor regional grouping and geofencing: a vehicle assigned to a
/// hub breaches the geofence when its position leaves the hub's radius.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hub {
    pub name: String,
    pub center: GeoPoint,
    /// Permitted operating radius from the hub center (km)
    pub radius_km: f64,
}

/// Assigned route geometry plus the allowed lateral corridor.
///
/// Geometry is a waypoint polyline; the route deviation rule measures
/// cross-track distance to the nearest segment. Computing or optimizing
/// the geometry itself is out of scope — corridors arrive pre-planned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteCorridor {
    pub name: String,
    pub waypoints: Vec<GeoPoint>,
    /// Allowed perpendicular distance from the polyline (km)
    pub corridor_width_km: f64,
}

/// A registered fleet vehicle.
///
/// Created on fleet registration, before any telemetry for its id is
/// accepted. Status is mutated by operational events; the record itself
/// is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Human-facing unique fleet number, e.g. "IND-MU-104"
    pub number: String,
    pub vehicle_type: VehicleType,
    /// Assigned hub; vehicles without one are never geofence-checked
    pub hub: Option<Hub>,
    /// Assigned route corridor; vehicles without one are never
    /// deviation-checked
    pub route: Option<RouteCorridor>,
    pub owner_id: Option<u64>,
    pub status: VehicleStatus,
    pub registered_at: DateTime<Utc>,
}
