//! Harsh braking rule — sharp speed drop between consecutive reports

use super::{AnomalyRule, RuleContext};
use crate::config::defaults::BRAKE_MAX_INTERVAL_SECS;
use crate::types::{Anomaly, AnomalyKind, Severity};

/// Fires when speed drops by more than the configured threshold between
/// two reports close enough in time to represent one braking event.
/// A drop across a long reporting gap says nothing about braking force.
pub struct HarshBrakingRule;

impl AnomalyRule for HarshBrakingRule {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::HarshBraking
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly> {
        let old = ctx.old?;
        let cfg = crate::config::get();

        let elapsed = (ctx.new.last_update - old.last_update).num_seconds();
        if elapsed <= 0 || elapsed > BRAKE_MAX_INTERVAL_SECS {
            return None;
        }

        let drop = old.speed_kmh - ctx.new.speed_kmh;
        if drop <= cfg.rules.brake_drop_kmh {
            return None;
        }

        Some(Anomaly::active(
            ctx.vehicle.id,
            AnomalyKind::HarshBraking,
            Severity::Medium,
            format!(
                "speed dropped {drop:.0} km/h in {elapsed}s ({:.0} -> {:.0} km/h)",
                old.speed_kmh, ctx.new.speed_kmh
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
    use chrono::Duration;

    fn check(old_speed: f64, new_speed: f64, elapsed_secs: i64) -> Option<Anomaly> {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Car);
        let p = GeoPoint::new(19.0, 72.0);
        let old = state(1, p, old_speed);
        let mut new = state(1, p, new_speed);
        new.last_update = old.last_update + Duration::seconds(elapsed_secs);
        let report = report(1, p, new_speed);
        HarshBrakingRule.check(&RuleContext {
            vehicle: &vehicle,
            old: Some(&old),
            new: &new,
            report: &report,
        })
    }

    #[test]
    fn test_sharp_drop_fires_medium() {
        let a = check(80.0, 20.0, 2).unwrap();
        assert_eq!(a.severity, Severity::Medium);
        assert_eq!(a.kind, AnomalyKind::HarshBraking);
    }

    #[test]
    fn test_gentle_slowdown_does_not_fire() {
        assert!(check(80.0, 60.0, 2).is_none());
    }

    #[test]
    fn test_drop_across_long_gap_ignored() {
        assert!(check(80.0, 0.0, 120).is_none());
    }

    #[test]
    fn test_first_report_has_no_baseline() {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Car);
        let p = GeoPoint::new(19.0, 72.0);
        let new = state(1, p, 0.0);
        let report = report(1, p, 0.0);
        assert!(HarshBrakingRule
            .check(&RuleContext {
                vehicle: &vehicle,
                old: None,
                new: &new,
                report: &report,
            })
            .is_none());
    }
}
