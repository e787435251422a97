//! Geofence rule — position outside the hub's permitted radius

use super::{AnomalyRule, RuleContext};
use crate::geo;
use crate::types::{Anomaly, AnomalyKind, Severity};

/// Fires when a vehicle leaves its assigned hub's operating radius.
/// Always high severity — a vehicle outside its region is an operational
/// incident regardless of distance. Vehicles without a hub are exempt.
pub struct GeofenceRule;

impl AnomalyRule for GeofenceRule {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::GeofenceBreach
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly> {
        let hub = ctx.vehicle.hub.as_ref()?;

        let distance = geo::haversine_km(ctx.new.position, hub.center);
        if distance <= hub.radius_km {
            return None;
        }

        Some(Anomaly::active(
            ctx.vehicle.id,
            AnomalyKind::GeofenceBreach,
            Severity::High,
            format!(
                "{distance:.1} km from hub '{}' (permitted {:.1} km)",
                hub.name, hub.radius_km
            ),
            ctx.new.position,
            ctx.report.timestamp,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::geo::GeoPoint;
    use crate::types::{Hub, VehicleType};

    fn mumbai_hub() -> Hub {
        Hub {
            name: "Mumbai".to_string(),
            center: GeoPoint::new(19.0760, 72.8777),
            radius_km: 25.0,
        }
    }

    fn check(position: GeoPoint) -> Option<Anomaly> {
        ensure_config();
        let mut vehicle = vehicle(1, VehicleType::Van);
        vehicle.hub = Some(mumbai_hub());
        let new = state(1, position, 40.0);
        let report = report(1, position, 40.0);
        GeofenceRule.check(&RuleContext {
            vehicle: &vehicle,
            old: None,
            new: &new,
            report: &report,
        })
    }

    #[test]
    fn test_inside_radius_does_not_fire() {
        assert!(check(GeoPoint::new(19.10, 72.90)).is_none());
    }

    #[test]
    fn test_outside_radius_is_high() {
        // Pune is ~120 km from the Mumbai hub center
        let a = check(GeoPoint::new(18.5204, 73.8567)).unwrap();
        assert_eq!(a.severity, Severity::High);
        assert_eq!(a.kind, AnomalyKind::GeofenceBreach);
    }

    #[test]
    fn test_vehicle_without_hub_exempt() {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Van);
        let p = GeoPoint::new(0.0, 0.0);
        let new = state(1, p, 40.0);
        let report = report(1, p, 40.0);
        assert!(GeofenceRule
            .check(&RuleContext {
                vehicle: &vehicle,
                old: None,
                new: &new,
                report: &report,
            })
            .is_none());
    }
}
