//! ==============================================================================
//! hardware.rs - ultrasonic tank level + dht22 climate
//! ==============================================================================
//!
//! purpose:
//!     the physical reading source. a failed read only blanks its own
//!     field(s); the sampler fills in zeros. two independent reads per tick:
//!     - water level from the echo round trip of an ultrasonic ranger
//!       mounted above the tank
//!     - temperature and humidity from a dht22, humidity clamped to 0-100
//!
//! relationships:
//!     - uses: gpio.rs (EchoLine, measure_echo, ClimateSensor, Dht22Subprocess)
//!     - configured by: config.rs ([hardware] section)
//!
//! ==============================================================================

use super::ReadingSource;
use crate::config::HardwareConfig;
use crate::domain::{round_to, Reading};
use crate::error::SensorError;
use crate::gpio::{measure_echo, ClimateSensor, EchoLine};
use std::time::Duration;

/// half the speed of sound in cm/s (the pulse travels there and back)
pub const HALF_SPEED_OF_SOUND_CM_S: f64 = 17150.0;

/// echo round trip time to distance in cm, rounded to 2 decimals
pub fn distance_cm(pulse: Duration) -> f64 {
    round_to(pulse.as_secs_f64() * HALF_SPEED_OF_SOUND_CM_S, 2)
}

/// distance from the sensor to the water surface, as a fill percentage
///
/// distance is clamped to [0, tank height] first, so readings past the
/// bottom count as empty and negative ones as full.
pub fn level_from_distance(distance_cm: f64, tank_height_cm: f64) -> f64 {
    let distance = distance_cm.clamp(0.0, tank_height_cm);
    (100.0 - distance / tank_height_cm * 100.0).clamp(0.0, 100.0)
}

pub struct HardwareSource<L, C> {
    line: L,
    climate: C,
    tank_height_cm: f64,
    echo_timeout: Duration,
}

impl<L: EchoLine, C: ClimateSensor> HardwareSource<L, C> {
    pub fn new(line: L, climate: C, tank_height_cm: f64, echo_timeout: Duration) -> Self {
        Self { line, climate, tank_height_cm, echo_timeout }
    }

    fn read_water_level(&mut self) -> Result<f64, SensorError> {
        let pulse = measure_echo(&mut self.line, self.echo_timeout)?;
        Ok(level_from_distance(distance_cm(pulse), self.tank_height_cm))
    }
}

impl<L: EchoLine, C: ClimateSensor> ReadingSource for HardwareSource<L, C> {
    fn name(&self) -> &'static str {
        "hardware"
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        let water_level = match self.read_water_level() {
            Ok(level) => Some(level),
            Err(e) => {
                tracing::warn!(error = %e, "water level read failed");
                None
            }
        };

        let (temperature, humidity) = match self.climate.read() {
            Ok((t, h)) => (Some(round_to(t, 1)), Some(round_to(h, 1).clamp(0.0, 100.0))),
            Err(e) => {
                tracing::warn!(error = %e, "dht22 read failed");
                (None, None)
            }
        };

        Ok(Reading {
            water_level,
            temperature,
            humidity,
            air_quality_index: None,
        })
    }
}

/// claim the pins from `config`, let the sensors settle, return the source
#[cfg(feature = "hardware")]
pub fn open(config: &HardwareConfig) -> Result<Box<dyn ReadingSource>, SensorError> {
    use crate::gpio::{Dht22Subprocess, RppalEchoLine};

    let line = RppalEchoLine::open(config.trigger_pin, config.echo_pin)?;
    let settle = Duration::from_secs(config.settle_seconds);
    tracing::info!(?settle, "waiting for sensors to settle");
    std::thread::sleep(settle);

    Ok(Box::new(HardwareSource::new(
        line,
        Dht22Subprocess::new(config.dht_pin),
        config.tank_height_cm,
        config.echo_timeout(),
    )))
}

#[cfg(not(feature = "hardware"))]
pub fn open(_config: &HardwareConfig) -> Result<Box<dyn ReadingSource>, SensorError> {
    Err(SensorError::Unsupported("hardware reading source"))
}
