//! Analytics Aggregator — rolling fleet-level metrics
//!
//! Recomputes a [`FleetMetricSample`] on each scheduled tick and holds the
//! recent samples in a fixed-capacity ring buffer, most-recent-last. The
//! distance/fuel model is a per-active-vehicle constant and the efficiency
//! figure comes from the estimator seam — both placeholders documented in
//! [`estimator`].

pub mod estimator;

pub use estimator::{EfficiencyEstimator, RandomWalkEstimator};

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::FleetMetricSample;

/// Per-tick metric computation and the sample ring buffer.
///
/// Not internally synchronized — the engine owns it behind its own lock.
pub struct FleetAggregator {
    samples: VecDeque<FleetMetricSample>,
    window_capacity: usize,
    distance_per_tick_km: f64,
    fuel_per_tick_l: f64,
    total_distance_km: f64,
    total_fuel_l: f64,
    estimator: Box<dyn EfficiencyEstimator>,
}

impl FleetAggregator {
    pub fn new(
        window_capacity: usize,
        distance_per_tick_km: f64,
        fuel_per_tick_l: f64,
        estimator: Box<dyn EfficiencyEstimator>,
    ) -> Self {
        Self {
            samples: VecDeque::with_capacity(window_capacity),
            window_capacity,
            distance_per_tick_km,
            fuel_per_tick_l,
            total_distance_km: 0.0,
            total_fuel_l: 0.0,
            estimator,
        }
    }

    /// Compute one tick's sample and push it into the ring buffer,
    /// evicting the oldest when at capacity.
    pub fn tick(
        &mut self,
        active_vehicles: usize,
        anomalies_in_window: u64,
        now: DateTime<Utc>,
    ) -> FleetMetricSample {
        let fleet = active_vehicles as f64;
        let distance_delta = fleet * self.distance_per_tick_km;
        let fuel_delta = fleet * self.fuel_per_tick_l;
        self.total_distance_km += distance_delta;
        self.total_fuel_l += fuel_delta;

        let sample = FleetMetricSample {
            timestamp: now,
            active_vehicles,
            anomalies_in_window,
            distance_km_delta: distance_delta,
            fuel_l_delta: fuel_delta,
            total_distance_km: self.total_distance_km,
            total_fuel_l: self.total_fuel_l,
            efficiency_pct: self.estimator.next(),
        };

        if self.samples.len() >= self.window_capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample.clone());

        sample
    }

    /// The most recent `n` samples, oldest first.
    pub fn recent(&self, n: usize) -> Vec<FleetMetricSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).cloned().collect()
    }

    /// Every buffered sample, oldest first.
    pub fn samples(&self) -> Vec<FleetMetricSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator(capacity: usize) -> FleetAggregator {
        FleetAggregator::new(
            capacity,
            0.011,
            0.004,
            Box::new(RandomWalkEstimator::with_seed(92.5, 90.0, 95.0, 0.6, 1)),
        )
    }

    #[test]
    fn test_ring_holds_min_of_ticks_and_capacity() {
        let mut agg = aggregator(10);
        for i in 0..4 {
            agg.tick(5, 0, Utc::now());
            assert_eq!(agg.len(), i + 1);
        }
        for _ in 0..20 {
            agg.tick(5, 0, Utc::now());
        }
        assert_eq!(agg.len(), 10);
    }

    #[test]
    fn test_oldest_evicted_most_recent_last() {
        let mut agg = aggregator(3);
        for i in 0..5 {
            agg.tick(i, 0, Utc::now());
        }
        let samples = agg.samples();
        assert_eq!(samples.len(), 3);
        // Ticks 0 and 1 evicted; 2, 3, 4 remain in order
        assert_eq!(samples[0].active_vehicles, 2);
        assert_eq!(samples[2].active_vehicles, 4);
    }

    #[test]
    fn test_distance_and_fuel_scale_with_active_fleet() {
        let mut agg = aggregator(10);
        let s = agg.tick(10, 0, Utc::now());
        assert!((s.distance_km_delta - 0.11).abs() < 1e-9);
        assert!((s.fuel_l_delta - 0.04).abs() < 1e-9);

        let s2 = agg.tick(10, 0, Utc::now());
        assert!((s2.total_distance_km - 0.22).abs() < 1e-9);
    }

    #[test]
    fn test_anomaly_window_count_passes_through() {
        let mut agg = aggregator(10);
        let s = agg.tick(3, 7, Utc::now());
        assert_eq!(s.anomalies_in_window, 7);
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut agg = aggregator(10);
        for i in 0..6 {
            agg.tick(i, 0, Utc::now());
        }
        let tail = agg.recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].active_vehicles, 4);
        assert_eq!(tail[1].active_vehicles, 5);
    }
}
