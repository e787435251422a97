//! Overspeed rule — class speed limit with excess-scaled severity

use super::{AnomalyRule, RuleContext};
use crate::types::{Anomaly, AnomalyKind, Severity};

/// Fires when the new speed exceeds the vehicle class limit. More than
/// 20% over the limit (configurable) escalates to high severity.
pub struct OverspeedRule;

impl AnomalyRule for OverspeedRule {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::Overspeed
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly> {
        let cfg = crate::config::get();
        let limit = cfg.speed_limits.for_type(ctx.vehicle.vehicle_type);
        let speed = ctx.new.speed_kmh;

        if speed <= limit {
            return None;
        }

        let excess_ratio = (speed - limit) / limit;
        let severity = if excess_ratio > cfg.rules.overspeed_high_excess_ratio {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Anomaly::active(
            ctx.vehicle.id,
            AnomalyKind::Overspeed,
            severity,
            format!(
                "{speed:.0} km/h against a {limit:.0} km/h {} limit ({:.0}% over)",
                ctx.vehicle.vehicle_type,
                excess_ratio * 100.0
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
    use crate::types::VehicleType;

    fn check(speed: f64) -> Option<Anomaly> {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Truck); // 90 km/h limit
        let p = GeoPoint::new(19.0, 72.0);
        let new = state(1, p, speed);
        let report = report(1, p, speed);
        OverspeedRule.check(&RuleContext {
            vehicle: &vehicle,
            old: None,
            new: &new,
            report: &report,
        })
    }

    #[test]
    fn test_at_limit_does_not_fire() {
        assert!(check(90.0).is_none());
    }

    #[test]
    fn test_moderate_excess_is_medium() {
        // 100 km/h is ~11% over a 90 km/h limit
        let a = check(100.0).unwrap();
        assert_eq!(a.severity, Severity::Medium);
    }

    #[test]
    fn test_large_excess_is_high() {
        // 130 km/h is ~44% over a 90 km/h limit
        let a = check(130.0).unwrap();
        assert_eq!(a.severity, Severity::High);
    }

    #[test]
    fn test_boundary_just_over_20_percent() {
        // 109 km/h is ~21% over: high. 108 km/h is 20% exactly: medium.
        assert_eq!(check(109.0).unwrap().severity, Severity::High);
        assert_eq!(check(108.0).unwrap().severity, Severity::Medium);
    }
}
