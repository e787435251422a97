//! Alert Feed — bounded, time-decaying view of detected anomalies
//!
//! Holds the user-facing alerts derived from anomalies. Capacity-bounded
//! with FIFO eviction: when full, the oldest entry goes regardless of
//! severity. Aging advances a fixed relative-time label ladder
//! (`just now → 1m ago → 2m ago → …`) once per aggregator tick and never
//! deletes — resolution and eviction are separate, explicit operations.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Anomaly, AnomalyKind, AnomalyStatus, VehicleId};

/// Relative-time label for a number of elapsed ticks.
fn age_label(ticks: u32) -> String {
    if ticks == 0 {
        "just now".to_string()
    } else {
        format!("{ticks}m ago")
    }
}

/// One feed entry: the anomaly plus its decaying age label.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    #[serde(flatten)]
    pub anomaly: Anomaly,
    /// Ticks since insertion. With the default 1 s tick this approximates
    /// minutes only when the aggregator period is 60 s; the ladder is
    /// cadence-relative by design.
    pub age_ticks: u32,
    /// Human-facing ladder label, advanced by [`AlertFeed::age`]
    pub age: String,
}

impl Alert {
    fn new(anomaly: Anomaly) -> Self {
        Self {
            anomaly,
            age_ticks: 0,
            age: age_label(0),
        }
    }
}

/// Capacity-bounded alert collection.
///
/// Not internally synchronized — the engine owns it behind its own lock.
pub struct AlertFeed {
    entries: VecDeque<Alert>,
    capacity: usize,
    evicted: u64,
}

impl AlertFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append an alert, evicting the oldest entry if at capacity.
    pub fn add(&mut self, anomaly: Anomaly) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(Alert::new(anomaly));
    }

    /// Resolve every active alert matching (vehicle, kind).
    ///
    /// Returns how many entries were resolved. Resolved entries stay in
    /// the feed until evicted, for the "recently resolved" view.
    pub fn resolve(&mut self, vehicle: VehicleId, kind: AnomalyKind, at: DateTime<Utc>) -> usize {
        let mut resolved = 0;
        for entry in &mut self.entries {
            if entry.anomaly.vehicle_id == vehicle
                && entry.anomaly.kind == kind
                && entry.anomaly.status == AnomalyStatus::Active
            {
                entry.anomaly.resolve(at);
                resolved += 1;
            }
        }
        resolved
    }

    /// Advance every alert one step down the age ladder.
    ///
    /// Invoked once per aggregator tick, never from ingestion. Performs no
    /// deletion and never regresses a label.
    pub fn age(&mut self) {
        for entry in &mut self.entries {
            entry.age_ticks = entry.age_ticks.saturating_add(1);
            entry.age = age_label(entry.age_ticks);
        }
    }

    /// Active alerts ordered most severe first, most recent first within
    /// a severity.
    pub fn top(&self, n: usize) -> Vec<Alert> {
        let mut active: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.anomaly.status == AnomalyStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.anomaly
                .severity
                .cmp(&a.anomaly.severity)
                .then(b.anomaly.detected_at.cmp(&a.anomaly.detected_at))
        });
        active.truncate(n);
        active
    }

    /// All active alerts in insertion order.
    pub fn active(&self) -> Vec<Alert> {
        self.entries
            .iter()
            .filter(|e| e.anomaly.status == AnomalyStatus::Active)
            .cloned()
            .collect()
    }

    /// Every entry, including recently resolved, in insertion order.
    pub fn all(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }

    /// Whether an active alert exists for (vehicle, kind). The rule engine
    /// consults this to suppress duplicate emissions.
    pub fn has_active(&self, vehicle: VehicleId, kind: AnomalyKind) -> bool {
        self.entries.iter().any(|e| {
            e.anomaly.vehicle_id == vehicle
                && e.anomaly.kind == kind
                && e.anomaly.status == AnomalyStatus::Active
        })
    }

    /// Set of active (vehicle, kind) pairs, for batch suppression checks.
    pub fn active_pairs(&self) -> HashSet<(VehicleId, AnomalyKind)> {
        self.entries
            .iter()
            .filter(|e| e.anomaly.status == AnomalyStatus::Active)
            .map(|e| (e.anomaly.vehicle_id, e.anomaly.kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries evicted by the capacity bound since startup.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::types::Severity;
    use chrono::Duration;

    fn anomaly(vehicle: VehicleId, kind: AnomalyKind, severity: Severity) -> Anomaly {
        Anomaly::active(
            vehicle,
            kind,
            severity,
            "test",
            GeoPoint::new(0.0, 0.0),
            Utc::now(),
        )
    }

    #[test]
    fn test_capacity_evicts_oldest_by_insertion_order() {
        let mut feed = AlertFeed::new(20);
        for i in 0..21 {
            feed.add(anomaly(i, AnomalyKind::Overspeed, Severity::High));
        }
        assert_eq!(feed.len(), 20);
        assert_eq!(feed.evicted(), 1);
        // Vehicle 0's alert (the oldest) is gone, severity notwithstanding
        assert!(!feed.has_active(0, AnomalyKind::Overspeed));
        assert!(feed.has_active(20, AnomalyKind::Overspeed));
    }

    #[test]
    fn test_age_ladder_progression() {
        let mut feed = AlertFeed::new(20);
        feed.add(anomaly(1, AnomalyKind::Sos, Severity::High));
        assert_eq!(feed.all()[0].age, "just now");

        feed.age();
        assert_eq!(feed.all()[0].age, "1m ago");

        feed.age();
        assert_eq!(feed.all()[0].age, "2m ago");
        assert_eq!(feed.all()[0].age_ticks, 2);
    }

    #[test]
    fn test_age_deletes_nothing() {
        let mut feed = AlertFeed::new(20);
        feed.add(anomaly(1, AnomalyKind::Overspeed, Severity::Medium));
        for _ in 0..100 {
            feed.age();
        }
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_resolve_marks_active_entries() {
        let mut feed = AlertFeed::new(20);
        feed.add(anomaly(1, AnomalyKind::Overspeed, Severity::High));
        feed.add(anomaly(1, AnomalyKind::LowFuel, Severity::Medium));

        let resolved = feed.resolve(1, AnomalyKind::Overspeed, Utc::now());
        assert_eq!(resolved, 1);
        assert!(!feed.has_active(1, AnomalyKind::Overspeed));
        assert!(feed.has_active(1, AnomalyKind::LowFuel));
        // Resolved entry stays visible in the full view
        assert_eq!(feed.all().len(), 2);
        assert_eq!(feed.active().len(), 1);
    }

    #[test]
    fn test_top_orders_by_severity_then_recency() {
        let mut feed = AlertFeed::new(20);
        let t0 = Utc::now();

        let mut low = anomaly(1, AnomalyKind::LowFuel, Severity::Low);
        low.detected_at = t0;
        let mut high_old = anomaly(2, AnomalyKind::GeofenceBreach, Severity::High);
        high_old.detected_at = t0 + Duration::seconds(1);
        let mut high_new = anomaly(3, AnomalyKind::Sos, Severity::High);
        high_new.detected_at = t0 + Duration::seconds(2);

        feed.add(low);
        feed.add(high_old);
        feed.add(high_new);

        let top = feed.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].anomaly.vehicle_id, 3);
        assert_eq!(top[1].anomaly.vehicle_id, 2);
    }

    #[test]
    fn test_top_excludes_resolved() {
        let mut feed = AlertFeed::new(20);
        feed.add(anomaly(1, AnomalyKind::Overspeed, Severity::High));
        feed.resolve(1, AnomalyKind::Overspeed, Utc::now());
        assert!(feed.top(10).is_empty());
    }
}
