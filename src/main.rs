//! fleetwatch - Fleet Operational Tracking Engine
//!
//! Real-time vehicle tracking, anomaly detection, and fleet analytics
//! over position-report telemetry.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults
//! cargo run --release
//!
//! # Custom bind address and tick period
//! cargo run --release -- --addr 0.0.0.0:9090 --tick-ms 500
//!
//! # Drive it with the bundled simulator
//! cargo run --release --bin simulate-fleet
//! ```
//!
//! # Environment Variables
//!
//! - `FLEETWATCH_CONFIG`: path to a fleet_config.toml
//! - `FLEETWATCH_SERVER_ADDR`: HTTP bind address override
//! - `FLEETWATCH_CORS_ORIGINS`: comma-separated dev dashboard origins
//! - `DATABASE_URL`: PostGIS sink connection string (feature `postgres`)
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use fleetwatch::api::{create_app, ApiState};
use fleetwatch::config::{self, FleetConfig};
use fleetwatch::engine::{scheduler, FleetEngine};
use fleetwatch::storage::{InMemorySink, SinkWriter, TelemetrySink};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(about = "Fleet Operational Tracking Engine")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the aggregator tick period in milliseconds
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    Scheduler,
    SinkWriter,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::Scheduler => write!(f, "Scheduler"),
            TaskName::SinkWriter => write!(f, "SinkWriter"),
        }
    }
}

// ============================================================================
// Sink Selection
// ============================================================================

/// Choose the durability sink: PostGIS when compiled in and configured,
/// in-memory otherwise. The hot path is identical either way.
async fn build_sink() -> Arc<dyn TelemetrySink> {
    #[cfg(feature = "postgres")]
    if let Ok(url) = std::env::var("DATABASE_URL") {
        match fleetwatch::storage::postgres::PostgresSink::connect(&url).await {
            Ok(sink) => {
                info!("✓ PostGIS durability sink connected");
                return Arc::new(sink);
            }
            Err(e) => {
                tracing::warn!(error = %e, "PostGIS sink unavailable — continuing in-memory");
            }
        }
    }
    Arc::new(InMemorySink::new())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  FLEETWATCH — Fleet Operational Tracking Engine");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Config: file/env load, then CLI overrides
    let mut fleet_config = FleetConfig::load();
    if let Ok(addr) = std::env::var("FLEETWATCH_SERVER_ADDR") {
        fleet_config.server.addr = addr;
    }
    if let Some(tick_ms) = args.tick_ms {
        fleet_config.analytics.tick_interval_ms = tick_ms;
    }
    if let Some(addr) = args.addr {
        fleet_config.server.addr = addr;
    }
    fleet_config.validate().context("invalid configuration")?;
    let server_addr = fleet_config.server.addr.clone();
    config::init(fleet_config);
    info!("✓ Configuration initialized");

    // Cancellation token governs every task's lifecycle
    let cancel_token = CancellationToken::new();

    // Durability sink + bounded writer (off the hot path)
    let sink = build_sink().await;
    info!(backend = sink.backend_name(), "✓ Durability sink ready");
    let (sink_writer, sink_task) =
        SinkWriter::spawn(sink, config::get().sink.queue_capacity, cancel_token.clone());

    // The engine and its owned tick scheduler
    let engine = Arc::new(FleetEngine::new(config::get(), sink_writer));
    info!("✓ Engine initialized");
    let scheduler_handle = scheduler::start(Arc::clone(&engine), &cancel_token);
    info!(
        period_ms = config::get().analytics.tick_interval_ms,
        "✓ Aggregation scheduler started"
    );

    // HTTP + websocket surface
    let app = create_app(ApiState::new(Arc::clone(&engine)));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("✓ HTTP server listening on {}", server_addr);
    info!("");
    info!("🎯 Ingest:    POST http://{}/api/v1/telemetry", server_addr);
    info!("🎯 Live feed: ws://{}/ws/tracking", server_addr);
    info!("");

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // HTTP server task
    {
        let cancel = cancel_token.clone();
        task_set.spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                    info!("[HttpServer] Received shutdown signal");
                })
                .await;
            match result {
                Ok(()) => Ok(TaskName::HttpServer),
                Err(e) => {
                    error!("[HttpServer] Server error: {}", e);
                    Err(anyhow::anyhow!("HTTP server error: {e}"))
                }
            }
        });
    }

    // Scheduler joiner task (the tick loop stops on cancellation)
    task_set.spawn(async move {
        let ticks = scheduler_handle.join().await;
        info!("[Scheduler] Stopped after {} ticks", ticks);
        Ok(TaskName::Scheduler)
    });

    // Sink writer joiner task
    task_set.spawn(async move {
        let _ = sink_task.await;
        Ok(TaskName::SinkWriter)
    });

    // Ctrl-C initiates the shutdown sequence
    {
        let cancel = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("");
                info!("Shutdown requested — stopping tasks");
                cancel.cancel();
            }
        });
    }

    // Supervise until every task drains
    while let Some(joined) = task_set.join_next().await {
        match joined {
            Ok(Ok(name)) => info!("[{}] Task finished cleanly", name),
            Ok(Err(e)) => {
                error!("Task failed: {e:#}");
                cancel_token.cancel();
            }
            Err(e) => {
                error!("Task panicked: {e}");
                cancel_token.cancel();
            }
        }
    }

    let stats = engine.stats();
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Reports Accepted:   {}", stats.reports_accepted);
    info!("   Reports Rejected:   {}", stats.reports_rejected);
    info!("   Anomalies Detected: {}", stats.anomalies_detected);
    info!("   Ticks:              {}", stats.ticks);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    Ok(())
}
