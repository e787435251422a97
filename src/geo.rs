//! Geodesic helpers: great-circle distance, bearing, cross-track distance
//!
//! All math is spherical (WGS84 treated as a sphere of mean radius), which
//! is accurate to well under 0.5% at fleet-corridor scales.

use serde::{Deserialize, Serialize};

/// Mean Earth radius (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point. Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Great-circle distance between two points (km), haversine formulation.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial bearing from `a` to `b` (radians from north).
fn bearing_rad(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x)
}

/// Perpendicular (cross-track) distance from `p` to the great-circle
/// segment `start → end` (km).
///
/// When the perpendicular foot falls outside the segment, the distance to
/// the nearer endpoint is returned instead, so corridors do not extend
/// past their waypoints.
pub fn cross_track_km(p: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    let d13 = haversine_km(start, p) / EARTH_RADIUS_KM;
    if d13 == 0.0 {
        return 0.0;
    }
    let theta13 = bearing_rad(start, p);
    let theta12 = bearing_rad(start, end);

    // Behind the start waypoint
    if (theta13 - theta12).cos() < 0.0 {
        return haversine_km(start, p);
    }

    let xt = (d13.sin() * (theta13 - theta12).sin()).asin();
    // Along-track angular position of the perpendicular foot
    let at = (d13.cos() / xt.cos()).clamp(-1.0, 1.0).acos();
    let seg_len = haversine_km(start, end) / EARTH_RADIUS_KM;

    if at > seg_len {
        // Past the end waypoint
        haversine_km(end, p)
    } else {
        xt.abs() * EARTH_RADIUS_KM
    }
}

/// Minimum distance from `p` to a waypoint polyline (km).
///
/// Returns `None` for polylines with fewer than two waypoints — a single
/// point is not a route.
pub fn distance_to_polyline_km(p: GeoPoint, waypoints: &[GeoPoint]) -> Option<f64> {
    if waypoints.len() < 2 {
        return None;
    }
    waypoints
        .windows(2)
        .map(|seg| cross_track_km(p, seg[0], seg[1]))
        .min_by(|a, b| a.total_cmp(b))
}
