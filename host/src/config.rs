//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `host.toml`.
//!     loads configuration from file or falls back to defaults.
//!     every section and field is optional; missing ones take the defaults.
//!
//! structure:
//!     - ServerConfig: Where the readings api listens.
//!     - SamplingConfig: Tick interval, window size, which reading source.
//!     - HardwareConfig: GPIO pins and tank geometry for the hardware source.
//!     - LoggingConfig: Log level and per-tick output.
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HostConfig {
    pub server: ServerConfig,
    pub sampling: SamplingConfig,
    pub hardware: HardwareConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Realistic,
    Random,
    Hardware,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_seconds: u64,
    /// samples kept in the window
    pub capacity: usize,
    pub source: SourceKind,
    /// fixed seed for the simulated sources; random when absent
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HardwareConfig {
    pub trigger_pin: u8,
    pub echo_pin: u8,
    pub dht_pin: u8,
    /// distance from the sensor to the tank floor
    pub tank_height_cm: f64,
    pub echo_timeout_ms: u64,
    pub settle_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8000".to_string() }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 2,
            capacity: crate::store::DEFAULT_CAPACITY,
            source: SourceKind::default(),
            seed: None,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            trigger_pin: 23,
            echo_pin: 24,
            dht_pin: 4,
            tank_height_cm: 100.0,
            echo_timeout_ms: 1000,
            settle_seconds: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl HardwareConfig {
    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    /// Parse and validate a `host.toml` document
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: HostConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback
    ///
    /// runs before logging is set up, so it reports on stdout.
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("config").join("host.toml"),
            std::path::PathBuf::from("..").join("config").join("host.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sampling.capacity == 0 {
            bail!("sampling.capacity must be at least 1");
        }
        if self.sampling.interval_seconds == 0 {
            bail!("sampling.interval_seconds must be at least 1");
        }
        let height = self.hardware.tank_height_cm;
        if !height.is_finite() || height <= 0.0 {
            bail!("hardware.tank_height_cm must be positive");
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│           HOST CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Bind: {}", self.server.bind);
        println!("│ Source: {:?}", self.sampling.source);
        println!("│ Sample Interval: {}s", self.sampling.interval_seconds);
        println!("│ Window: {} samples", self.sampling.capacity);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
