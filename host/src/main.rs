//! ==============================================================================
//! main.rs - tank telemetry server entry point
//! ==============================================================================
//!
//! purpose:
//!     samples the tank and room sensors in the background and serves the
//!     most recent window to the dashboard frontend.
//!
//! responsibilities:
//!     - load host.toml (or defaults) and set up logging
//!     - build the configured reading source (realistic, random or hardware)
//!     - spawn the sampling loop (2s cycle by default)
//!     - serve GET /api/readings (port 8000 by default)
//!     - on ctrl-c: stop the server, cancel the loop, wait for it to exit
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────┐
//!     │                  rust host (this file)               │
//!     │  ┌──────────────┐                ┌────────────────┐  │
//!     │  │ sampler loop │                │  web server    │  │
//!     │  │ (2s cycle)   │                │  (port 8000)   │  │
//!     │  └──────┬───────┘                └───────┬────────┘  │
//!     │         │ push                  snapshot │           │
//!     │         └──────────┐      ┌──────────────┘           │
//!     │                ┌───┴──────┴───┐                      │
//!     │                │ ReadingStore │ <- store.rs          │
//!     │                └──────────────┘                      │
//!     └──────────────────────────────────────────────────────┘
//!
//! ==============================================================================

use anyhow::Result;
use std::sync::Arc;
use tank_telemetry::clock::{Clock, SystemClock};
use tank_telemetry::config::HostConfig;
use tank_telemetry::sampler::Sampler;
use tank_telemetry::store::ReadingStore;
use tank_telemetry::{server, source};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Tank Telemetry Server");
    println!("  water level | temperature | humidity | air quality");
    println!("===========================================================");

    // step 1: load configuration
    let config = HostConfig::load_or_default();
    init_logging(&config.logging.level);
    config.print_summary();

    // step 2: build the reading source (may block for the sensor settle time)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reading_source = {
        let config = config.clone();
        let clock = clock.clone();
        tokio::task::spawn_blocking(move || source::build(&config, clock)).await??
    };

    // step 3: the one piece of shared state
    let store = ReadingStore::new(config.sampling.capacity, reading_source.reports_aqi());

    // step 4: sampling loop in background
    let shutdown = CancellationToken::new();
    let sampler = Sampler::new(reading_source, store.clone(), clock, config.sampling.interval())
        .show_sensor_data(config.logging.show_sensor_data)
        .spawn(shutdown.child_token());

    // step 5: web server in background
    let mut web = tokio::spawn(server::serve(config.server.bind.clone(), store, shutdown.clone()));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutdown requested");
        }
        result = &mut web => {
            // server exited on its own, usually a bind failure
            shutdown.cancel();
            sampler.stop().await?;
            return result?;
        }
    }

    shutdown.cancel();
    sampler.stop().await?;
    web.await??;
    tracing::info!("bye");
    Ok(())
}

/// RUST_LOG wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
