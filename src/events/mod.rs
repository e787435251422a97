//! Event Distributor — fan-out of engine events to subscribed consumers
//!
//! Each subscriber gets its own bounded channel. Publishing never blocks:
//! a subscriber whose buffer is full is dropped on the spot (counted, not
//! fatal), so one stalled dashboard cannot back-pressure ingestion. An
//! in-flight publish to a just-unsubscribed consumer lands in a closed
//! channel and is silently discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::EngineEvent;

/// A live subscription. Dropping it (or calling
/// [`EventDistributor::unsubscribe`]) ends delivery.
pub struct Subscription {
    pub id: u64,
    rx: mpsc::Receiver<EngineEvent>,
}

impl Subscription {
    /// Receive the next event; `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive for polling consumers.
    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }
}

/// Fan-out hub for the three engine event kinds.
pub struct EventDistributor {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<EngineEvent>>>,
    next_id: AtomicU64,
    dropped_subscribers: AtomicU64,
    published: AtomicU64,
    buffer: usize,
}

impl EventDistributor {
    /// `buffer` is the per-subscriber queue depth before it is dropped
    /// as too slow.
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            dropped_subscribers: AtomicU64::new(0),
            published: AtomicU64::new(0),
            buffer,
        }
    }

    /// Register a consumer. Delivery starts with the next publish.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.lock().insert(id, tx);
        debug!(subscriber = id, "subscriber registered");
        Subscription { id, rx }
    }

    /// Remove a consumer. Guarantees no further deliveries to it.
    pub fn unsubscribe(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            debug!(subscriber = id, "subscriber removed");
        }
    }

    /// Deliver an event to every live subscriber, best-effort.
    pub fn publish(&self, event: &EngineEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);

        let mut stale = Vec::new();
        {
            let subs = self.lock();
            for (&id, tx) in subs.iter() {
                match tx.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            subscriber = id,
                            event = event.kind_name(),
                            "subscriber buffer overflow — dropping subscriber"
                        );
                        self.dropped_subscribers.fetch_add(1, Ordering::Relaxed);
                        stale.push(id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        // Receiver already gone; harmless
                        stale.push(id);
                    }
                }
            }
        }
        if !stale.is_empty() {
            let mut subs = self.lock();
            for id in stale {
                subs.remove(&id);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Subscribers dropped for buffer overflow since startup.
    pub fn dropped_subscribers(&self) -> u64 {
        self.dropped_subscribers.load(Ordering::Relaxed)
    }

    /// Total events published since startup.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<EngineEvent>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FleetMetricSample;
    use chrono::Utc;

    fn metrics_event() -> EngineEvent {
        EngineEvent::MetricsSampled(FleetMetricSample {
            timestamp: Utc::now(),
            active_vehicles: 1,
            anomalies_in_window: 0,
            distance_km_delta: 0.0,
            fuel_l_delta: 0.0,
            total_distance_km: 0.0,
            total_fuel_l: 0.0,
            efficiency_pct: 92.0,
        })
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let dist = EventDistributor::new(8);
        let mut sub = dist.subscribe();
        dist.publish(&metrics_event());
        let event = sub.recv().await.expect("event expected");
        assert_eq!(event.kind_name(), "metrics_sampled");
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let dist = EventDistributor::new(8);
        let mut sub = dist.subscribe();
        dist.unsubscribe(sub.id);
        dist.publish(&metrics_event());
        // Channel is closed and empty: recv returns None, not an event
        assert!(sub.recv().await.is_none());
        assert_eq!(dist.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_dropped_on_overflow() {
        let dist = EventDistributor::new(2);
        let _sub = dist.subscribe();
        // Never drained: third publish overflows the buffer of two
        dist.publish(&metrics_event());
        dist.publish(&metrics_event());
        assert_eq!(dist.dropped_subscribers(), 0);
        dist.publish(&metrics_event());
        assert_eq!(dist.dropped_subscribers(), 1);
        assert_eq!(dist.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_overflow_does_not_affect_other_subscribers() {
        let dist = EventDistributor::new(2);
        let _stalled = dist.subscribe();
        let mut healthy = dist.subscribe();

        dist.publish(&metrics_event());
        dist.publish(&metrics_event());
        // Healthy drains, stalled does not
        assert!(healthy.try_recv().is_some());
        dist.publish(&metrics_event());

        assert_eq!(dist.dropped_subscribers(), 1);
        assert_eq!(dist.subscriber_count(), 1);
        assert!(healthy.try_recv().is_some());
    }
}
