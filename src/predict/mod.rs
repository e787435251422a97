//! ETA prediction with a validity-window cache
//!
//! Great-circle distance over recent speed, degraded to a configured base
//! speed with a traffic factor when the vehicle is effectively stationary.
//! Results are cached per vehicle and recomputed only after the validity
//! window lapses, mirroring the external `predictions` cache semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::config::defaults::{
    ETA_CONFIDENCE_FAR, ETA_CONFIDENCE_NEAR, ETA_NEAR_DISTANCE_KM,
};
use crate::geo::{self, GeoPoint};
use crate::types::{VehicleId, VehicleState};

/// Speed below which a vehicle is treated as stationary for ETA purposes.
const STATIONARY_SPEED_KMH: f64 = 5.0;

/// One ETA prediction.
#[derive(Debug, Clone, Serialize)]
pub struct EtaPrediction {
    pub vehicle_id: VehicleId,
    pub distance_km: f64,
    pub avg_speed_kmh: f64,
    pub predicted_minutes: i64,
    pub estimated_arrival: DateTime<Utc>,
    pub confidence: f64,
    pub valid_until: DateTime<Utc>,
}

struct CacheEntry {
    prediction: EtaPrediction,
    destination: GeoPoint,
}

/// Per-vehicle ETA predictor and cache.
pub struct EtaPredictor {
    cache: Mutex<HashMap<VehicleId, CacheEntry>>,
    ttl: Duration,
    base_speed_kmh: f64,
}

impl EtaPredictor {
    pub fn new(cache_ttl_secs: u64, base_speed_kmh: f64) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(cache_ttl_secs as i64),
            base_speed_kmh,
        }
    }

    /// Predict arrival at `destination`, serving from cache while a
    /// prediction for the same destination is still valid.
    pub fn predict(
        &self,
        state: &VehicleState,
        destination: GeoPoint,
        now: DateTime<Utc>,
    ) -> EtaPrediction {
        {
            let cache = self.lock();
            if let Some(entry) = cache.get(&state.vehicle_id) {
                if entry.prediction.valid_until > now && entry.destination == destination {
                    return entry.prediction.clone();
                }
            }
        }

        let distance_km = geo::haversine_km(state.position, destination);

        // Recent speed when moving, base speed with a traffic factor
        // otherwise — the stand-in until a learned model lands
        let cruise = if state.speed_kmh > STATIONARY_SPEED_KMH {
            state.speed_kmh
        } else {
            self.base_speed_kmh
        };
        let traffic_factor = rand::thread_rng().gen_range(0.8..1.2);
        let avg_speed_kmh = (cruise * traffic_factor).max(1.0);

        let predicted_minutes = (distance_km / avg_speed_kmh * 60.0).round() as i64;
        let confidence = if distance_km < ETA_NEAR_DISTANCE_KM {
            ETA_CONFIDENCE_NEAR
        } else {
            ETA_CONFIDENCE_FAR
        };

        let prediction = EtaPrediction {
            vehicle_id: state.vehicle_id,
            distance_km,
            avg_speed_kmh,
            predicted_minutes,
            estimated_arrival: now + Duration::minutes(predicted_minutes),
            confidence,
            valid_until: now + self.ttl,
        };

        self.lock().insert(
            state.vehicle_id,
            CacheEntry {
                prediction: prediction.clone(),
                destination,
            },
        );
        prediction
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<VehicleId, CacheEntry>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
