//! Low fuel rule — reported fuel level below the configured floor

use super::{AnomalyRule, RuleContext};
use crate::types::{Anomaly, AnomalyKind, Severity};

/// Fires when a unit reports a fuel level under the configured floor.
/// Units that never report fuel are exempt.
pub struct LowFuelRule;

impl AnomalyRule for LowFuelRule {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::LowFuel
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly> {
        let fuel = ctx.new.fuel_level_pct?;
        let cfg = crate::config::get();

        if fuel >= cfg.rules.low_fuel_pct {
            return None;
        }

        Some(Anomaly::active(
            ctx.vehicle.id,
            AnomalyKind::LowFuel,
            Severity::Medium,
            format!("fuel at {fuel:.0}% (floor {:.0}%)", cfg.rules.low_fuel_pct),
            ctx.new.position,
            ctx.report.timestamp,
        ))
    }
}
