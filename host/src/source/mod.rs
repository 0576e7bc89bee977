//! ==============================================================================
//! source/ - pluggable producers of one reading per tick
//! ==============================================================================
//!
//! variants:
//!     - realistic.rs: stateful simulated tank + climate + aqi (default)
//!     - random.rs:    independent uniform draws, demo placeholder
//!     - hardware.rs:  ultrasonic ranger + dht22 on a raspberry pi
//!
//! all three implement `ReadingSource`, so the sampler and the store never
//! know which one is plugged in.
//!
//! ==============================================================================

pub mod hardware;
pub mod random;
pub mod realistic;

pub use hardware::HardwareSource;
pub use random::RandomSource;
pub use realistic::RealisticSource;

use crate::clock::Clock;
use crate::config::{HostConfig, SourceKind};
use crate::domain::Reading;
use crate::error::SensorError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

pub trait ReadingSource: Send {
    /// short name for logs
    fn name(&self) -> &'static str;

    /// whether readings carry an air quality index
    fn reports_aqi(&self) -> bool {
        false
    }

    /// take one reading. blocking; the sampler calls this off the async runtime.
    ///
    /// a field the source could not read is `None`. `Err` means nothing
    /// usable came back at all.
    fn read(&mut self) -> Result<Reading, SensorError>;
}

impl<S: ReadingSource + ?Sized> ReadingSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reports_aqi(&self) -> bool {
        (**self).reports_aqi()
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read()
    }
}

/// build the source selected by `[sampling] source`
///
/// blocks for the sensor settle time when the hardware source is chosen.
pub fn build(config: &HostConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Box<dyn ReadingSource>> {
    let rng = match config.sampling.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let source: Box<dyn ReadingSource> = match config.sampling.source {
        SourceKind::Realistic => Box::new(RealisticSource::new(rng, clock)),
        SourceKind::Random => Box::new(RandomSource::new(rng)),
        SourceKind::Hardware => hardware::open(&config.hardware)?,
    };

    tracing::info!(source = source.name(), aqi = source.reports_aqi(), "reading source ready");
    Ok(source)
}
