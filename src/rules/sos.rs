//! SOS rule — explicit driver distress flag

use super::{AnomalyRule, RuleContext};
use crate::types::{Anomaly, AnomalyKind, Severity};

/// Fires whenever a report carries the SOS flag. Always high severity and
/// exempt from duplicate suppression — a repeated distress signal must
/// never be swallowed.
pub struct SosRule;

impl AnomalyRule for SosRule {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::Sos
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly> {
        if !ctx.report.sos {
            return None;
        }

        Some(Anomaly::active(
            ctx.vehicle.id,
            AnomalyKind::Sos,
            Severity::High,
            format!("SOS signal from vehicle {}", ctx.vehicle.number),
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

    #[test]
    fn test_sos_flag_fires_high() {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Bus);
        let p = GeoPoint::new(19.0, 72.0);
        let new = state(1, p, 40.0);
        let mut report = report(1, p, 40.0);
        report.sos = true;
        let a = SosRule
            .check(&RuleContext {
                vehicle: &vehicle,
                old: None,
                new: &new,
                report: &report,
            })
            .unwrap();
        assert_eq!(a.severity, Severity::High);
    }

    #[test]
    fn test_no_flag_no_anomaly() {
        ensure_config();
        let vehicle = vehicle(1, VehicleType::Bus);
        let p = GeoPoint::new(19.0, 72.0);
        let new = state(1, p, 40.0);
        let report = report(1, p, 40.0);
        assert!(SosRule
            .check(&RuleContext {
                vehicle: &vehicle,
                old: None,
                new: &new,
                report: &report,
            })
            .is_none());
    }
}
