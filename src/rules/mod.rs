//! Anomaly rules — deterministic checks run on every accepted report
//!
//! Each rule inspects the before/after state pair from one domain
//! perspective and emits at most one anomaly. Rules are independent;
//! several may fire for a single update. The engine suppresses a rule's
//! emission while an active alert for the same (vehicle, kind) pair
//! exists in the feed — SOS bypasses suppression.
//!
//! ## Rules
//!
//! 1. **Overspeed** — class speed limit, severity scales with excess
//! 2. **HarshBraking** — sharp speed drop between consecutive reports
//! 3. **RouteDeviation** — cross-track distance from the assigned corridor
//! 4. **Geofence** — position outside the hub's permitted radius
//! 5. **LowFuel** — reported fuel level below the configured floor
//! 6. **Sos** — explicit distress flag, always high severity

pub mod geofence;
pub mod harsh_braking;
pub mod low_fuel;
pub mod overspeed;
pub mod route_deviation;
pub mod sos;

pub use geofence::GeofenceRule;
pub use harsh_braking::HarshBrakingRule;
pub use low_fuel::LowFuelRule;
pub use overspeed::OverspeedRule;
pub use route_deviation::RouteDeviationRule;
pub use sos::SosRule;

use std::collections::HashSet;

use crate::types::{Anomaly, AnomalyKind, PositionReport, Vehicle, VehicleId, VehicleState};

/// Everything a rule may look at for one update.
pub struct RuleContext<'a> {
    pub vehicle: &'a Vehicle,
    /// State before this report was applied; `None` on the first report
    pub old: Option<&'a VehicleState>,
    /// State after this report was applied
    pub new: &'a VehicleState,
    pub report: &'a PositionReport,
}

/// Trait for per-update anomaly checks.
pub trait AnomalyRule: Send + Sync {
    /// The anomaly kind this rule emits.
    fn kind(&self) -> AnomalyKind;

    /// Evaluate one update. Pure computation over the context — no I/O.
    fn check(&self, ctx: &RuleContext<'_>) -> Option<Anomaly>;
}

/// Create the default rule set in evaluation order.
pub fn default_rules() -> Vec<Box<dyn AnomalyRule>> {
    vec![
        Box::new(SosRule),
        Box::new(OverspeedRule),
        Box::new(HarshBrakingRule),
        Box::new(RouteDeviationRule),
        Box::new(GeofenceRule),
        Box::new(LowFuelRule),
    ]
}

/// Stateless-per-call evaluator over the configured rule set.
pub struct RuleEngine {
    rules: Vec<Box<dyn AnomalyRule>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Run every rule against one update.
    ///
    /// `active_pairs` is the feed's current set of active (vehicle, kind)
    /// alerts; a rule whose pair is already active is suppressed, except
    /// SOS which always passes through.
    pub fn evaluate(
        &self,
        ctx: &RuleContext<'_>,
        active_pairs: &HashSet<(VehicleId, AnomalyKind)>,
    ) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for rule in &self.rules {
            let kind = rule.kind();
            if kind != AnomalyKind::Sos && active_pairs.contains(&(ctx.vehicle.id, kind)) {
                continue;
            }
            if let Some(anomaly) = rule.check(ctx) {
                anomalies.push(anomaly);
            }
        }
        anomalies
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::geo::GeoPoint;
    use crate::types::{
        PositionReport, Vehicle, VehicleId, VehicleState, VehicleStatus, VehicleType,
    };

    /// Initialize the global config with defaults, once, for rule tests.
    pub fn ensure_config() {
        if !crate::config::is_initialized() {
            crate::config::init(crate::config::FleetConfig::default());
        }
    }

    pub fn vehicle(id: VehicleId, vehicle_type: VehicleType) -> Vehicle {
        Vehicle {
            id,
            number: format!("TEST-{id}"),
            vehicle_type,
            hub: None,
            route: None,
            owner_id: None,
            status: VehicleStatus::Active,
            registered_at: Utc::now(),
        }
    }

    pub fn state(id: VehicleId, position: GeoPoint, speed_kmh: f64) -> VehicleState {
        VehicleState {
            vehicle_id: id,
            position,
            raw_position: position,
            speed_kmh,
            heading_deg: None,
            fuel_level_pct: None,
            status: VehicleStatus::Active,
            last_update: Utc::now(),
        }
    }

    pub fn report(id: VehicleId, position: GeoPoint, speed_kmh: f64) -> PositionReport {
        PositionReport {
            vehicle_id: id,
            latitude: position.lat,
            longitude: position.lon,
            speed_kmh,
            heading_deg: None,
            accuracy_m: None,
            altitude_m: None,
            fuel_level_pct: None,
            sos: false,
            timestamp: Utc::now(),
        }
    }
}
