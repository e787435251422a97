//! Fleet traffic simulator
//!
//! Seeds a fleet across the configured hubs, registers every vehicle with
//! the engine, then drives a random-walk movement model and posts
//! telemetry on a fixed cadence. Useful for exercising the full pipeline
//! (ingest → rules → alerts → metrics → websocket feed) without hardware.
//!
//! ```bash
//! cargo run --bin simulate-fleet -- --api http://localhost:8080 --period-ms 2000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "simulate-fleet")]
#[command(about = "Synthetic fleet movement generator for fleetwatch")]
#[command(version)]
struct CliArgs {
    /// Base URL of the fleetwatch API
    #[arg(long, default_value = "http://localhost:8080")]
    api: String,

    /// Vehicles seeded per hub
    #[arg(long, default_value = "5")]
    vehicles_per_hub: u64,

    /// Telemetry cadence in milliseconds
    #[arg(long, default_value = "2000")]
    period_ms: u64,

    /// Probability per update that a vehicle reports an SOS
    #[arg(long, default_value = "0.0005")]
    sos_probability: f64,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Hub seed list (name, lat, lon).
const HUBS: &[(&str, f64, f64)] = &[
    ("Mumbai", 19.0760, 72.8777),
    ("Delhi", 28.6139, 77.2090),
    ("Bangalore", 12.9716, 77.5946),
    ("Chennai", 13.0827, 80.2707),
    ("Kolkata", 22.5726, 88.3639),
    ("Hyderabad", 17.3850, 78.4867),
    ("Ahmedabad", 23.0225, 72.5714),
];

const VEHICLE_TYPES: &[&str] = &["truck", "van", "bus", "car", "motorcycle"];

struct SimVehicle {
    id: u64,
    number: String,
    vehicle_type: &'static str,
    hub: &'static str,
    hub_center: (f64, f64),
    lat: f64,
    lon: f64,
    speed: f64,
    heading: f64,
    fuel: f64,
}

fn seed_fleet(per_hub: u64, rng: &mut StdRng) -> Vec<SimVehicle> {
    let mut fleet = Vec::new();
    let mut id = 100;
    for &(name, lat, lon) in HUBS {
        for _ in 0..per_hub {
            let prefix: String = name.chars().take(2).collect();
            fleet.push(SimVehicle {
                id,
                number: format!("IND-{}-{id}", prefix.to_uppercase()),
                vehicle_type: VEHICLE_TYPES[(id % VEHICLE_TYPES.len() as u64) as usize],
                hub: name,
                hub_center: (lat, lon),
                lat: lat + (rng.gen::<f64>() - 0.5) * 0.05,
                lon: lon + (rng.gen::<f64>() - 0.5) * 0.05,
                speed: rng.gen_range(30.0..80.0),
                heading: rng.gen_range(0.0..360.0),
                fuel: rng.gen_range(40.0..100.0),
            });
            id += 1;
        }
    }
    fleet
}

async fn register_fleet(
    client: &reqwest::Client,
    api: &str,
    fleet: &[SimVehicle],
) -> Result<usize> {
    let mut registered = 0;
    for v in fleet {
        let body = json!({
            "id": v.id,
            "number": v.number,
            "vehicle_type": v.vehicle_type,
            "hub": {
                "name": v.hub,
                "center": { "lat": v.hub_center.0, "lon": v.hub_center.1 },
                "radius_km": 25.0,
            },
        });
        let resp = client
            .post(format!("{api}/api/v1/vehicles"))
            .json(&body)
            .send()
            .await
            .context("registration request failed")?;
        // 409 means a previous run already registered this id — fine
        if resp.status().is_success() || resp.status().as_u16() == 409 {
            registered += 1;
        } else {
            warn!(vehicle = v.id, status = %resp.status(), "registration rejected");
        }
    }
    Ok(registered)
}

/// One random-walk movement step.
fn step(v: &mut SimVehicle, noise: &Normal<f64>, rng: &mut StdRng) {
    v.lat += (rng.gen::<f64>() - 0.5) * 0.001;
    v.lon += (rng.gen::<f64>() - 0.5) * 0.001;
    v.speed = (v.speed + noise.sample(rng)).clamp(0.0, 140.0);
    v.heading = (v.heading + (rng.gen::<f64>() - 0.5) * 10.0).rem_euclid(360.0);
    v.fuel = (v.fuel - rng.gen::<f64>() * 0.05).max(0.0);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let speed_noise = Normal::new(0.0, 2.5).context("invalid noise distribution")?;

    let client = reqwest::Client::new();
    let mut fleet = seed_fleet(args.vehicles_per_hub, &mut rng);

    info!("🚀 Registering {} vehicles across {} hubs...", fleet.len(), HUBS.len());
    let registered = register_fleet(&client, &args.api, &fleet).await?;
    info!("✓ {} vehicles registered", registered);

    info!(
        period_ms = args.period_ms,
        "📡 Starting traffic simulation — Ctrl-C to stop"
    );
    let mut interval =
        tokio::time::interval(std::time::Duration::from_millis(args.period_ms));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Simulation stopped.");
                return Ok(());
            }
            _ = interval.tick() => {}
        }

        let mut accepted = 0usize;
        for v in &mut fleet {
            step(v, &speed_noise, &mut rng);
            let sos = rng.gen::<f64>() < args.sos_probability;
            let payload = json!({
                "vehicle_id": v.id,
                "latitude": v.lat,
                "longitude": v.lon,
                "speed_kmh": v.speed,
                "heading_deg": v.heading,
                "accuracy_m": 5.0,
                "fuel_level_pct": v.fuel,
                "sos": sos,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });

            match client
                .post(format!("{}/api/v1/telemetry", args.api))
                .json(&payload)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => accepted += 1,
                Ok(resp) => {
                    warn!(vehicle = v.id, status = %resp.status(), "telemetry rejected");
                }
                Err(e) => warn!(vehicle = v.id, error = %e, "connection error"),
            }
        }
        info!("📡 Sent {}/{} updates", accepted, fleet.len());
    }
}
