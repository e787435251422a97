//! Fleet efficiency estimation seam
//!
//! The bounded random walk below is a documented stand-in for a measured
//! quantity — there is no real fuel/telemetry feed yet. Swapping in a real
//! estimator means implementing [`EfficiencyEstimator`] and handing it to
//! the aggregator; nothing else in the pipeline changes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the fleet efficiency figure for each tick.
pub trait EfficiencyEstimator: Send {
    /// Next efficiency value (percent).
    fn next(&mut self) -> f64;
}

/// Bounded random walk around a baseline. Placeholder, not a model.
pub struct RandomWalkEstimator {
    current: f64,
    min: f64,
    max: f64,
    step: f64,
    rng: StdRng,
}

impl RandomWalkEstimator {
    pub fn new(baseline: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            current: baseline.clamp(min, max),
            min,
            max,
            step,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for tests.
    #[cfg(test)]
    pub fn with_seed(baseline: f64, min: f64, max: f64, step: f64, seed: u64) -> Self {
        Self {
            current: baseline.clamp(min, max),
            min,
            max,
            step,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl EfficiencyEstimator for RandomWalkEstimator {
    fn next(&mut self) -> f64 {
        let delta = self.rng.gen_range(-self.step..=self.step);
        self.current = (self.current + delta).clamp(self.min, self.max);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stays_in_bounds() {
        let mut est = RandomWalkEstimator::with_seed(92.5, 90.0, 95.0, 0.6, 42);
        for _ in 0..10_000 {
            let v = est.next();
            assert!((90.0..=95.0).contains(&v), "escaped bounds: {v}");
        }
    }

    #[test]
    fn test_walk_actually_moves() {
        let mut est = RandomWalkEstimator::with_seed(92.5, 90.0, 95.0, 0.6, 7);
        let first = est.next();
        let moved = (0..100).any(|_| (est.next() - first).abs() > 0.01);
        assert!(moved);
    }
}
