//! Fleet Configuration Module
//!
//! Provides deployment configuration loaded from TOML files, replacing
//! hardcoded thresholds with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `FLEETWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `fleet_config.toml` in the current working directory
//! 3. Built-in defaults (the values observed in the spec)
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(FleetConfig::load());
//!
//! // Anywhere in the codebase:
//! let capacity = config::get().alerts.capacity;
//! ```

mod fleet_config;
pub mod defaults;

pub use fleet_config::*;

use std::sync::OnceLock;

/// Global fleet configuration, initialized once at startup.
static FLEET_CONFIG: OnceLock<FleetConfig> = OnceLock::new();

/// Initialize the global fleet configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: FleetConfig) {
    if FLEET_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global fleet configuration.
///
/// Panics if `init()` has not been called. This is by design — a missing
/// config is a fatal startup error, not a recoverable condition.
pub fn get() -> &'static FleetConfig {
    FLEET_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the config has been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    FLEET_CONFIG.get().is_some()
}
