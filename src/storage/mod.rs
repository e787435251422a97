//! TelemetrySink trait — pluggable durability/audit sink
//!
//! The relational store (vehicles, location_tracking, anomalies) is a
//! collaborator, not part of the hot path. Writes go through a bounded
//! queue drained by a dedicated task: best-effort, never blocking
//! ingestion, degrading gracefully when the sink is unreachable.
//!
//! - `InMemorySink`: default for tests and sink-less deployments
//! - `PostgresSink` (feature `postgres`): PostGIS-backed production sink

#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SinkError;
use crate::types::{Anomaly, PositionReport, Vehicle};

/// Trait for durability backends.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Persist a registered vehicle.
    async fn store_vehicle(&self, vehicle: &Vehicle) -> Result<(), SinkError>;

    /// Append a position report to the tracking table.
    async fn store_report(&self, report: &PositionReport) -> Result<(), SinkError>;

    /// Persist a detected anomaly for audit.
    async fn store_anomaly(&self, anomaly: &Anomaly) -> Result<(), SinkError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// In-memory sink for testing and minimal deployments.
///
/// Thread-safe via `RwLock`. Not durable — data lost on restart.
pub struct InMemorySink {
    vehicles: std::sync::RwLock<Vec<Vehicle>>,
    reports: std::sync::RwLock<Vec<PositionReport>>,
    anomalies: std::sync::RwLock<Vec<Anomaly>>,
    max_reports: usize,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self {
            vehicles: std::sync::RwLock::new(Vec::new()),
            reports: std::sync::RwLock::new(Vec::new()),
            anomalies: std::sync::RwLock::new(Vec::new()),
            max_reports: 100_000,
        }
    }

    pub fn report_count(&self) -> usize {
        self.reports.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.read().map(|v| v.len()).unwrap_or(0)
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySink for InMemorySink {
    async fn store_vehicle(&self, vehicle: &Vehicle) -> Result<(), SinkError> {
        self.vehicles
            .write()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?
            .push(vehicle.clone());
        Ok(())
    }

    async fn store_report(&self, report: &PositionReport) -> Result<(), SinkError> {
        let mut reports = self
            .reports
            .write()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        if reports.len() >= self.max_reports {
            reports.remove(0);
        }
        reports.push(report.clone());
        Ok(())
    }

    async fn store_anomaly(&self, anomaly: &Anomaly) -> Result<(), SinkError> {
        self.anomalies
            .write()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?
            .push(anomaly.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

// ============================================================================
// Sink Writer — bounded queue between the hot path and the backend
// ============================================================================

/// A record queued for the sink.
#[derive(Debug, Clone)]
pub enum SinkRecord {
    Vehicle(Vehicle),
    Report(PositionReport),
    Anomaly(Anomaly),
}

/// Handle for offering records to the sink without touching the hot path.
///
/// `offer_*` never blocks: when the queue is full the record is dropped
/// and counted, and the pipeline keeps serving live consumers.
#[derive(Clone)]
pub struct SinkWriter {
    tx: mpsc::Sender<SinkRecord>,
    dropped: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl SinkWriter {
    /// Spawn the drain task and return the writer handle alongside it.
    pub fn spawn(
        sink: Arc<dyn TelemetrySink>,
        queue_capacity: usize,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<SinkRecord>(queue_capacity);
        let dropped = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        let failed_task = Arc::clone(&failed);
        let task = tokio::spawn(async move {
            info!(backend = sink.backend_name(), "[SinkWriter] Task starting");
            loop {
                let record = tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("[SinkWriter] Shutdown signal received");
                        break;
                    }
                    record = rx.recv() => match record {
                        Some(r) => r,
                        None => break,
                    },
                };

                let result = match &record {
                    SinkRecord::Vehicle(v) => sink.store_vehicle(v).await,
                    SinkRecord::Report(r) => sink.store_report(r).await,
                    SinkRecord::Anomaly(a) => sink.store_anomaly(a).await,
                };
                if let Err(e) = result {
                    failed_task.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        backend = sink.backend_name(),
                        error = %e,
                        "sink write failed — continuing without durability"
                    );
                }
            }
            debug!("[SinkWriter] Drained and stopped");
        });

        (Self { tx, dropped, failed }, task)
    }

    pub fn offer_vehicle(&self, vehicle: Vehicle) {
        self.offer(SinkRecord::Vehicle(vehicle));
    }

    pub fn offer_report(&self, report: PositionReport) {
        self.offer(SinkRecord::Report(report));
    }

    pub fn offer_anomaly(&self, anomaly: Anomaly) {
        self.offer(SinkRecord::Anomaly(anomaly));
    }

    fn offer(&self, record: SinkRecord) {
        if self.tx.try_send(record).is_err() {
            // Queue full or writer gone — durability degrades, hot path does not
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records the backend rejected.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
