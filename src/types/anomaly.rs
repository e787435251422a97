//! Anomaly types: kinds, severity, and detection records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vehicle::VehicleId;
use crate::geo::GeoPoint;

/// Kind of detected deviation from expected vehicle behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Overspeed,
    HarshBraking,
    RouteDeviation,
    GeofenceBreach,
    MaintenanceDue,
    LowFuel,
    Sos,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::Overspeed => write!(f, "overspeed"),
            AnomalyKind::HarshBraking => write!(f, "harsh_braking"),
            AnomalyKind::RouteDeviation => write!(f, "route_deviation"),
            AnomalyKind::GeofenceBreach => write!(f, "geofence_breach"),
            AnomalyKind::MaintenanceDue => write!(f, "maintenance_due"),
            AnomalyKind::LowFuel => write!(f, "low_fuel"),
            AnomalyKind::Sos => write!(f, "sos"),
        }
    }
}

/// Severity of an anomaly. Ordering is by operational urgency.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Whether an anomaly is still open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    Active,
    Resolved,
}

/// A detected anomaly, retained for audit after resolution.
///
/// Invariant: `status == Active` implies `resolved_at == None`. The
/// converse may not hold transiently while a resolution is propagating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub vehicle_id: VehicleId,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub description: String,
    pub location: GeoPoint,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub status: AnomalyStatus,
}

impl Anomaly {
    /// Build an active anomaly at the given location.
    pub fn active(
        vehicle_id: VehicleId,
        kind: AnomalyKind,
        severity: Severity,
        description: impl Into<String>,
        location: GeoPoint,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicle_id,
            kind,
            severity,
            description: description.into(),
            location,
            detected_at,
            resolved_at: None,
            status: AnomalyStatus::Active,
        }
    }

    /// Mark resolved at the given instant.
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        self.status = AnomalyStatus::Resolved;
        self.resolved_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_active_anomaly_has_no_resolution() {
        let a = Anomaly::active(
            1,
            AnomalyKind::Overspeed,
            Severity::High,
            "130 km/h in a 90 km/h class",
            GeoPoint::new(19.07, 72.87),
            Utc::now(),
        );
        assert_eq!(a.status, AnomalyStatus::Active);
        assert!(a.resolved_at.is_none());
    }

    #[test]
    fn test_resolve_sets_timestamp_and_status() {
        let mut a = Anomaly::active(
            1,
            AnomalyKind::Sos,
            Severity::High,
            "driver distress",
            GeoPoint::new(0.0, 0.0),
            Utc::now(),
        );
        let at = Utc::now();
        a.resolve(at);
        assert_eq!(a.status, AnomalyStatus::Resolved);
        assert_eq!(a.resolved_at, Some(at));
    }
}
