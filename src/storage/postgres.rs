//! PostGIS-backed durability sink (feature `postgres`)
//!
//! Writes the external schema the reporting tools read: `vehicles`,
//! `location_tracking` (point geometry alongside raw lat/lon), and
//! `anomalies`. Geometry columns use SRID 4326.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use super::TelemetrySink;
use crate::error::SinkError;
use crate::types::{Anomaly, AnomalyStatus, PositionReport, Vehicle};

/// Production sink over a PostgreSQL/PostGIS pool.
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    /// Connect a pool from `DATABASE_URL`-style connection string.
    pub async fn connect(database_url: &str) -> Result<Self, SinkError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        info!("Connected to PostgreSQL durability sink");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetrySink for PostgresSink {
    async fn store_vehicle(&self, vehicle: &Vehicle) -> Result<(), SinkError> {
        sqlx::query(
            "INSERT INTO vehicles (vehicle_id, vehicle_number, vehicle_type, owner_id, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (vehicle_id) DO UPDATE SET status = EXCLUDED.status",
        )
        .bind(vehicle.id as i64)
        .bind(&vehicle.number)
        .bind(vehicle.vehicle_type.to_string())
        .bind(vehicle.owner_id.map(|id| id as i64))
        .bind(vehicle.status.to_string())
        .bind(vehicle.registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn store_report(&self, report: &PositionReport) -> Result<(), SinkError> {
        sqlx::query(
            "INSERT INTO location_tracking
                 (vehicle_id, position, latitude, longitude, speed, direction, accuracy, altitude, timestamp)
             VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326), $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(report.vehicle_id as i64)
        .bind(report.longitude)
        .bind(report.latitude)
        .bind(report.latitude)
        .bind(report.longitude)
        .bind(report.speed_kmh)
        .bind(report.heading_deg)
        .bind(report.accuracy_m)
        .bind(report.altitude_m)
        .bind(report.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn store_anomaly(&self, anomaly: &Anomaly) -> Result<(), SinkError> {
        let status = match anomaly.status {
            AnomalyStatus::Active => "active",
            AnomalyStatus::Resolved => "resolved",
        };
        sqlx::query(
            "INSERT INTO anomalies
                 (vehicle_id, anomaly_type, severity, description, location, detected_at, resolved_at, status)
             VALUES ($1, $2, $3, $4, ST_SetSRID(ST_MakePoint($5, $6), 4326), $7, $8, $9)",
        )
        .bind(anomaly.vehicle_id as i64)
        .bind(anomaly.kind.to_string())
        .bind(anomaly.severity.to_string())
        .bind(&anomaly.description)
        .bind(anomaly.location.lon)
        .bind(anomaly.location.lat)
        .bind(anomaly.detected_at)
        .bind(anomaly.resolved_at)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
