//! FleetEngine — single owner of the tracking/alerting pipeline
//!
//! Wires the components in data-flow order: ingest validation → state
//! store mutation → rule evaluation over the before/after pair → alert
//! feed → event fan-out, with the aggregator sampling on a scheduled tick
//! (see [`scheduler`]). Callers interact only through the operations
//! here; every snapshot handed out is a value copy.

pub mod scheduler;

pub use scheduler::SchedulerHandle;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::alerts::{Alert, AlertFeed};
use crate::analytics::{FleetAggregator, RandomWalkEstimator};
use crate::config::FleetConfig;
use crate::error::{IngestError, RegistryError};
use crate::events::{EventDistributor, Subscription};
use crate::geo::GeoPoint;
use crate::history::TrackHistory;
use crate::ingest::{self, SmootherBank};
use crate::predict::{EtaPredictor, EtaPrediction};
use crate::rules::{RuleContext, RuleEngine};
use crate::state::StateStore;
use crate::storage::SinkWriter;
use crate::types::{
    Anomaly, AnomalyKind, EngineEvent, FleetMetricSample, PositionReport, Vehicle, VehicleId,
    VehicleState, VehicleStatus,
};

/// Outcome of one accepted report.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub state: VehicleState,
    pub anomalies: Vec<Anomaly>,
}

/// Per-item outcome for bulk ingestion. The batch never aborts; each
/// report is applied independently.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemOutcome {
    pub vehicle_id: VehicleId,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Engine counters for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub reports_accepted: u64,
    pub reports_rejected: u64,
    pub anomalies_detected: u64,
    pub ticks: u64,
    pub subscribers: usize,
    pub dropped_subscribers: u64,
    pub sink_queue_dropped: u64,
}

/// The tracking/alerting/aggregation engine.
pub struct FleetEngine {
    store: StateStore,
    rules: RuleEngine,
    feed: Mutex<AlertFeed>,
    aggregator: Mutex<FleetAggregator>,
    distributor: EventDistributor,
    history: TrackHistory,
    smoother: SmootherBank,
    predictor: EtaPredictor,
    sink: SinkWriter,
    tick_interval_ms: u64,

    anomalies_since_tick: AtomicU64,
    reports_accepted: AtomicU64,
    reports_rejected: AtomicU64,
    anomalies_detected: AtomicU64,
    ticks: AtomicU64,
}

impl FleetEngine {
    /// Build an engine from config. The sink writer is injected so the
    /// backend (in-memory, Postgres) is the caller's choice.
    pub fn new(config: &FleetConfig, sink: SinkWriter) -> Self {
        let estimator = RandomWalkEstimator::new(
            config.analytics.efficiency_baseline_pct,
            config.analytics.efficiency_min_pct,
            config.analytics.efficiency_max_pct,
            config.analytics.efficiency_step_pct,
        );
        Self {
            store: StateStore::new(),
            rules: RuleEngine::new(),
            feed: Mutex::new(AlertFeed::new(config.alerts.capacity)),
            aggregator: Mutex::new(FleetAggregator::new(
                config.analytics.window_capacity,
                config.analytics.distance_per_tick_km,
                config.analytics.fuel_per_tick_l,
                Box::new(estimator),
            )),
            distributor: EventDistributor::new(config.events.subscriber_buffer),
            history: TrackHistory::new(config.ingest.history_per_vehicle),
            smoother: SmootherBank::new(
                config.ingest.smoothing_process_noise,
                config.ingest.smoothing_measurement_noise,
            ),
            predictor: EtaPredictor::new(
                config.predict.cache_ttl_secs,
                config.predict.base_speed_kmh,
            ),
            sink,
            tick_interval_ms: config.analytics.tick_interval_ms,
            anomalies_since_tick: AtomicU64::new(0),
            reports_accepted: AtomicU64::new(0),
            reports_rejected: AtomicU64::new(0),
            anomalies_detected: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Ingest one position report.
    ///
    /// Accepted reports mutate the state store exactly once, feed the rule
    /// engine with the pre-mutation snapshot, and fan out events. Rejected
    /// reports change nothing and return a reason synchronously.
    pub fn ingest(&self, report: PositionReport) -> Result<IngestReceipt, IngestError> {
        let result = self.ingest_inner(&report);
        match &result {
            Ok(receipt) => {
                self.reports_accepted.fetch_add(1, Ordering::Relaxed);
                debug!(
                    vehicle = report.vehicle_id,
                    anomalies = receipt.anomalies.len(),
                    "report accepted"
                );
            }
            Err(e) => {
                self.reports_rejected.fetch_add(1, Ordering::Relaxed);
                debug!(vehicle = report.vehicle_id, reason = e.code(), "report rejected");
            }
        }
        result
    }

    fn ingest_inner(&self, report: &PositionReport) -> Result<IngestReceipt, IngestError> {
        ingest::validate(report)?;

        // Pre-checks before the smoother sees the fix — a rejected report
        // must not pollute the filter's velocity estimate. apply() repeats
        // both checks authoritatively under its write lock.
        if self.store.vehicle(report.vehicle_id).is_none() {
            return Err(IngestError::UnknownVehicle(report.vehicle_id));
        }
        if let Some(current) = self.store.get(report.vehicle_id) {
            if report.timestamp <= current.last_update {
                return Err(IngestError::StaleReport {
                    vehicle: report.vehicle_id,
                    reported: report.timestamp,
                    current: current.last_update,
                });
            }
        }

        let smoothed = self.smoother.smooth(report.vehicle_id, report.position());
        let (old, new) = self.store.apply(report, smoothed)?;

        self.history.append(report.clone());
        self.sink.offer_report(report.clone());
        self.distributor
            .publish(&EngineEvent::VehicleStateChanged(new.clone()));

        // The vehicle existed under apply()'s lock; a concurrent removal is
        // impossible because vehicles are never deleted.
        let anomalies = match self.store.vehicle(report.vehicle_id) {
            Some(vehicle) => {
                let ctx = RuleContext {
                    vehicle: &vehicle,
                    old: old.as_ref(),
                    new: &new,
                    report,
                };
                let active_pairs = self.lock_feed().active_pairs();
                self.rules.evaluate(&ctx, &active_pairs)
            }
            None => Vec::new(),
        };

        for anomaly in &anomalies {
            self.raise(anomaly.clone());
        }

        Ok(IngestReceipt {
            state: new,
            anomalies,
        })
    }

    /// Apply a batch of reports independently, returning per-item outcomes.
    pub fn ingest_bulk(&self, reports: Vec<PositionReport>) -> Vec<BulkItemOutcome> {
        reports
            .into_iter()
            .map(|report| {
                let vehicle_id = report.vehicle_id;
                match self.ingest(report) {
                    Ok(_) => BulkItemOutcome {
                        vehicle_id,
                        accepted: true,
                        reason: None,
                    },
                    Err(e) => BulkItemOutcome {
                        vehicle_id,
                        accepted: false,
                        reason: Some(e.code().to_string()),
                    },
                }
            })
            .collect()
    }

    /// Record an anomaly into the feed and fan it out.
    ///
    /// Used by the rule engine and by the manual report endpoint.
    pub fn raise(&self, anomaly: Anomaly) {
        self.anomalies_detected.fetch_add(1, Ordering::Relaxed);
        self.anomalies_since_tick.fetch_add(1, Ordering::Relaxed);
        info!(
            vehicle = anomaly.vehicle_id,
            kind = %anomaly.kind,
            severity = %anomaly.severity,
            "ANOMALY: {}",
            anomaly.description
        );
        self.sink.offer_anomaly(anomaly.clone());
        self.lock_feed().add(anomaly.clone());
        self.distributor.publish(&EngineEvent::AnomalyRaised(anomaly));
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register a vehicle so its telemetry is accepted.
    pub fn register_vehicle(&self, vehicle: Vehicle) -> Result<(), RegistryError> {
        self.store.register(vehicle.clone())?;
        self.sink.offer_vehicle(vehicle.clone());
        info!(
            vehicle = vehicle.id,
            number = %vehicle.number,
            vehicle_type = %vehicle.vehicle_type,
            "vehicle registered"
        );
        Ok(())
    }

    /// Transition a vehicle's lifecycle status.
    pub fn set_vehicle_status(
        &self,
        id: VehicleId,
        status: VehicleStatus,
    ) -> Result<(), RegistryError> {
        self.store.set_status(id, status)?;
        info!(vehicle = id, status = %status, "vehicle status changed");
        if let Some(state) = self.store.get(id) {
            self.distributor
                .publish(&EngineEvent::VehicleStateChanged(state));
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.store.vehicle(id)
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.store.vehicles()
    }

    pub fn vehicle_state(&self, id: VehicleId) -> Option<VehicleState> {
        self.store.get(id)
    }

    pub fn snapshot(&self) -> Vec<VehicleState> {
        self.store.snapshot_all()
    }

    pub fn recent_track(&self, id: VehicleId, n: usize) -> Vec<PositionReport> {
        self.history.recent(id, n)
    }

    pub fn track_range(
        &self,
        id: VehicleId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<PositionReport> {
        self.history.range(id, from, to)
    }

    pub fn alerts_top(&self, n: usize) -> Vec<Alert> {
        self.lock_feed().top(n)
    }

    pub fn alerts_active(&self) -> Vec<Alert> {
        self.lock_feed().active()
    }

    pub fn alerts_all(&self) -> Vec<Alert> {
        self.lock_feed().all()
    }

    /// Explicitly resolve active alerts for (vehicle, kind).
    pub fn resolve_alert(&self, vehicle: VehicleId, kind: AnomalyKind) -> usize {
        self.lock_feed().resolve(vehicle, kind, Utc::now())
    }

    pub fn metrics_recent(&self, n: usize) -> Vec<FleetMetricSample> {
        self.lock_aggregator().recent(n)
    }

    /// Predict arrival for a vehicle with a known position.
    pub fn predict_eta(&self, id: VehicleId, destination: GeoPoint) -> Option<EtaPrediction> {
        let state = self.store.get(id)?;
        Some(self.predictor.predict(&state, destination, Utc::now()))
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            reports_accepted: self.reports_accepted.load(Ordering::Relaxed),
            reports_rejected: self.reports_rejected.load(Ordering::Relaxed),
            anomalies_detected: self.anomalies_detected.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            subscribers: self.distributor.subscriber_count(),
            dropped_subscribers: self.distributor.dropped_subscribers(),
            sink_queue_dropped: self.sink.dropped(),
        }
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe(&self) -> Subscription {
        self.distributor.subscribe()
    }

    pub fn unsubscribe(&self, id: u64) {
        self.distributor.unsubscribe(id);
    }

    // ========================================================================
    // Scheduled tick
    // ========================================================================

    /// One aggregation/aging cycle. Invoked by the scheduler task, or
    /// directly by tests.
    pub fn tick(&self) -> FleetMetricSample {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.lock_feed().age();

        let active = self.store.active_count();
        let anomalies = self.anomalies_since_tick.swap(0, Ordering::Relaxed);
        let sample = self
            .lock_aggregator()
            .tick(active, anomalies, Utc::now());

        self.distributor
            .publish(&EngineEvent::MetricsSampled(sample.clone()));
        sample
    }

    /// Configured tick period.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    fn lock_feed(&self) -> std::sync::MutexGuard<'_, AlertFeed> {
        match self.feed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_aggregator(&self) -> std::sync::MutexGuard<'_, FleetAggregator> {
        match self.aggregator.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Build a manually-reported anomaly (operator or external detector).
pub fn manual_anomaly(
    vehicle_id: VehicleId,
    kind: AnomalyKind,
    severity: crate::types::Severity,
    description: String,
    location: GeoPoint,
) -> Anomaly {
    Anomaly::active(vehicle_id, kind, severity, description, location, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemorySink, SinkWriter};
    use crate::types::VehicleType;
    use chrono::Duration;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn ensure_config() {
        if !crate::config::is_initialized() {
            crate::config::init(FleetConfig::default());
        }
    }

    async fn engine() -> (FleetEngine, Arc<InMemorySink>, CancellationToken) {
        ensure_config();
        let sink = Arc::new(InMemorySink::new());
        let cancel = CancellationToken::new();
        let (writer, _task) = SinkWriter::spawn(sink.clone(), 64, cancel.clone());
        (
            FleetEngine::new(&FleetConfig::default(), writer),
            sink,
            cancel,
        )
    }

    fn vehicle(id: VehicleId) -> Vehicle {
        Vehicle {
            id,
            number: format!("TEST-{id}"),
            vehicle_type: VehicleType::Truck,
            hub: None,
            route: None,
            owner_id: None,
            status: VehicleStatus::Active,
            registered_at: Utc::now(),
        }
    }

    fn report(id: VehicleId, speed: f64, ts: DateTime<Utc>) -> PositionReport {
        PositionReport {
            vehicle_id: id,
            latitude: 19.0,
            longitude: 72.0,
            speed_kmh: speed,
            heading_deg: None,
            accuracy_m: None,
            altitude_m: None,
            fuel_level_pct: None,
            sos: false,
            timestamp: ts,
        }
    }

    #[tokio::test]
    async fn test_unknown_vehicle_produces_nothing() {
        let (engine, _sink, _cancel) = engine().await;
        let err = engine.ingest(report(99, 40.0, Utc::now())).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_VEHICLE");
        assert!(engine.snapshot().is_empty());
        assert!(engine.alerts_active().is_empty());
        assert_eq!(engine.stats().reports_rejected, 1);
    }

    #[tokio::test]
    async fn test_overspeed_dedup_through_feed() {
        let (engine, _sink, _cancel) = engine().await;
        engine.register_vehicle(vehicle(1)).unwrap();

        let t0 = Utc::now();
        engine.ingest(report(1, 0.0, t0)).unwrap();

        // 130 km/h against the 90 km/h truck limit: one high overspeed
        let receipt = engine
            .ingest(report(1, 130.0, t0 + Duration::seconds(1)))
            .unwrap();
        assert_eq!(receipt.anomalies.len(), 1);
        assert_eq!(receipt.anomalies[0].kind, AnomalyKind::Overspeed);
        assert_eq!(receipt.anomalies[0].severity, crate::types::Severity::High);

        // Repeat while the alert is still active: suppressed
        let repeat = engine
            .ingest(report(1, 131.0, t0 + Duration::seconds(2)))
            .unwrap();
        assert!(repeat.anomalies.is_empty());

        // After resolution the rule may fire again
        engine.resolve_alert(1, AnomalyKind::Overspeed);
        let again = engine
            .ingest(report(1, 132.0, t0 + Duration::seconds(3)))
            .unwrap();
        assert_eq!(again.anomalies.len(), 1);
    }

    #[tokio::test]
    async fn test_tick_counts_anomalies_in_window() {
        let (engine, _sink, _cancel) = engine().await;
        engine.register_vehicle(vehicle(1)).unwrap();
        engine.register_vehicle(vehicle(2)).unwrap();

        let t0 = Utc::now();
        engine.ingest(report(1, 130.0, t0)).unwrap(); // overspeed
        engine.ingest(report(2, 40.0, t0)).unwrap();

        let sample = engine.tick();
        assert_eq!(sample.active_vehicles, 2);
        assert_eq!(sample.anomalies_in_window, 1);

        // Window resets after the tick
        let next = engine.tick();
        assert_eq!(next.anomalies_in_window, 0);
    }

    #[tokio::test]
    async fn test_tick_publishes_metrics_event() {
        let (engine, _sink, _cancel) = engine().await;
        let mut sub = engine.subscribe();
        engine.tick();
        let event = sub.recv().await.expect("metrics event");
        assert_eq!(event.kind_name(), "metrics_sampled");
    }

    #[tokio::test]
    async fn test_ingest_publishes_state_change() {
        let (engine, _sink, _cancel) = engine().await;
        engine.register_vehicle(vehicle(1)).unwrap();
        let mut sub = engine.subscribe();
        engine.ingest(report(1, 40.0, Utc::now())).unwrap();
        let event = sub.recv().await.expect("state event");
        assert_eq!(event.kind_name(), "vehicle_state_changed");
    }

    #[tokio::test]
    async fn test_bulk_ingest_is_independent_per_item() {
        let (engine, _sink, _cancel) = engine().await;
        engine.register_vehicle(vehicle(1)).unwrap();

        let t0 = Utc::now();
        let outcomes = engine.ingest_bulk(vec![
            report(1, 40.0, t0),
            report(7, 40.0, t0),          // unknown vehicle
            report(1, 45.0, t0),          // stale (same timestamp)
            report(1, 50.0, t0 + Duration::seconds(1)),
        ]);

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].accepted);
        assert_eq!(outcomes[1].reason.as_deref(), Some("UNKNOWN_VEHICLE"));
        assert_eq!(outcomes[2].reason.as_deref(), Some("STALE_REPORT"));
        assert!(outcomes[3].accepted);
    }

    #[tokio::test]
    async fn test_sink_receives_accepted_reports() {
        let (engine, sink, cancel) = engine().await;
        engine.register_vehicle(vehicle(1)).unwrap();
        engine.ingest(report(1, 40.0, Utc::now())).unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(sink.report_count(), 1);
        assert_eq!(sink.vehicle_count(), 1);
        cancel.cancel();
    }
}
