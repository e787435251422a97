//! Route deviation rule — cross-track distance from the assigned corridor

use super::{AnomalyRule, RuleContext};
use crate::geo;
use crate::types::{Anomaly, AnomalyKind, Severity};

/// Fires when the smoothed position is further from the assigned route
/// polyline than the corridor width. Severity scales with distance:
/// beyond the configured multiple of the width it escalates to high.
/// Vehicles without an assigned route are never checked.
pub struct RouteDeviationRule;

impl AnomalyRule for RouteDeviationRule {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::RouteDeviation
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly> {
        let route = ctx.vehicle.route.as_ref()?;
        let cfg = crate::config::get();

        let width = if route.corridor_width_km > 0.0 {
            route.corridor_width_km
        } else {
            cfg.rules.corridor_width_km
        };

        let distance = geo::distance_to_polyline_km(ctx.new.position, &route.waypoints)?;
        if distance <= width {
            return None;
        }

        let severity = if distance > width * cfg.rules.deviation_high_multiple {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Anomaly::active(
            ctx.vehicle.id,
            AnomalyKind::RouteDeviation,
            severity,
            format!(
                "{distance:.2} km off route '{}' (corridor {width:.2} km)",
                route.name
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
    use crate::types::{RouteCorridor, VehicleType};

    fn corridor() -> RouteCorridor {
        RouteCorridor {
            name: "NH-48".to_string(),
            waypoints: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
            corridor_width_km: 0.5,
        }
    }

    fn check(position: GeoPoint) -> Option<Anomaly> {
        ensure_config();
        let mut vehicle = vehicle(1, VehicleType::Truck);
        vehicle.route = Some(corridor());
        let new = state(1, position, 60.0);
        let report = report(1, position, 60.0);
        RouteDeviationRule.check(&RuleContext {
            vehicle: &vehicle,
            old: None,
            new: &new,
            report: &report,
        })
    }

    #[test]
    fn test_on_route_does_not_fire() {
        assert!(check(GeoPoint::new(0.0, 0.5)).is_none());
    }

    #[test]
    fn test_inside_corridor_does_not_fire() {
        // ~0.003 deg lat is ~0.33 km off the line
        assert!(check(GeoPoint::new(0.003, 0.5)).is_none());
    }

    #[test]
    fn test_moderate_deviation_is_medium() {
        // ~0.007 deg lat is ~0.78 km off: over width, under 2x width
        let a = check(GeoPoint::new(0.007, 0.5)).unwrap();
        assert_eq!(a.severity, Severity::Medium);
    }

    #[test]
    fn test_far_deviation_is_high() {
        // ~0.02 deg lat is ~2.2 km off: past 2x the 0.5 km corridor
        let a = check(GeoPoint::new(0.02, 0.5)).unwrap();
        assert_eq!(a.severity, Severity::High);
    }

    #[test]
    fn test_vehicle_without_route_never_checked() {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Truck);
        let p = GeoPoint::new(45.0, 45.0);
        let new = state(1, p, 60.0);
        let report = report(1, p, 60.0);
        assert!(RouteDeviationRule
            .check(&RuleContext {
                vehicle: &vehicle,
                old: None,
                new: &new,
                report: &report,
            })
            .is_none());
    }
}
