//! ==============================================================================
//! sampler.rs - the sampling loop
//! ==============================================================================
//!
//! purpose:
//!     every `interval`: pull one reading from the source, turn it into a
//!     sample, push it into the store. runs until its cancellation token
//!     fires.
//!
//! failure policy:
//!     a bad tick never ends the loop.
//!     - field missing from a reading  -> 0 for that field, warn
//!     - source returned Err           -> all fields 0, error
//!     - source panicked               -> tick skipped, error
//!
//! states:
//!     Running -> Stopped, observable through `SamplerHandle::state()`.
//!
//! ==============================================================================

use crate::clock::Clock;
use crate::domain::{AqiCategory, Reading, Sample};
use crate::source::ReadingSource;
use crate::store::ReadingStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

pub struct Sampler<S> {
    // tokio mutex: no poisoning if the source panics mid-read
    source: Arc<Mutex<S>>,
    reports_aqi: bool,
    store: ReadingStore,
    clock: Arc<dyn Clock>,
    interval: Duration,
    show_sensor_data: bool,
}

impl<S: ReadingSource + 'static> Sampler<S> {
    pub fn new(source: S, store: ReadingStore, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            reports_aqi: source.reports_aqi(),
            source: Arc::new(Mutex::new(source)),
            store,
            clock,
            interval,
            show_sensor_data: false,
        }
    }

    /// log every sample at info instead of debug
    pub fn show_sensor_data(mut self, show: bool) -> Self {
        self.show_sensor_data = show;
        self
    }

    /// run the loop on a new task
    pub fn spawn(self, cancel: CancellationToken) -> SamplerHandle {
        let (state_tx, state_rx) = watch::channel(LoopState::Running);
        let task = tokio::spawn(self.run(cancel.clone(), state_tx));
        SamplerHandle { cancel, state: state_rx, task }
    }

    /// sample until `cancel` fires
    pub async fn run(self, cancel: CancellationToken, state: watch::Sender<LoopState>) {
        state.send_replace(LoopState::Running);
        info!(interval = ?self.interval, "sampling loop started");

        while !cancel.is_cancelled() {
            self.tick().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        state.send_replace(LoopState::Stopped);
        info!("sampling loop stopped");
    }

    /// take one reading and store it; returns what was stored
    pub async fn tick(&self) -> Option<Sample> {
        let source = self.source.clone();
        let outcome = tokio::task::spawn_blocking(move || source.blocking_lock().read()).await;

        let reading = match outcome {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                error!(error = %e, "reading source failed, recording zeros");
                Reading::default()
            }
            Err(e) => {
                error!(error = %e, "reading source crashed, skipping tick");
                return None;
            }
        };

        let sample = self.to_sample(reading);
        self.log_sample(&sample);
        self.store.push(sample).await;
        Some(sample)
    }

    fn to_sample(&self, reading: Reading) -> Sample {
        let mut missing = Vec::new();
        let mut or_zero = |value: Option<f64>, name: &'static str| {
            value.unwrap_or_else(|| {
                missing.push(name);
                0.0
            })
        };

        let water_level = or_zero(reading.water_level, "water_level");
        let temperature = or_zero(reading.temperature, "temperature");
        let humidity = or_zero(reading.humidity, "humidity");

        let air_quality_index = match reading.air_quality_index {
            Some(aqi) => Some(aqi.min(500)),
            None if self.reports_aqi => {
                missing.push("aqi");
                Some(0)
            }
            None => None,
        };

        if !missing.is_empty() {
            warn!(?missing, "substituting zero for failed readings");
        }

        Sample {
            water_level,
            temperature,
            humidity,
            air_quality_index,
            captured_at: self.clock.now(),
        }
    }

    fn log_sample(&self, sample: &Sample) {
        let aqi = sample
            .air_quality_index
            .map(|aqi| format!(", AQI: {} ({})", aqi, AqiCategory::from_index(aqi).label()))
            .unwrap_or_default();

        if self.show_sensor_data {
            info!(
                "Water Level: {}%, Temp: {}°C, Humidity: {}%{}",
                sample.water_level, sample.temperature, sample.humidity, aqi
            );
        } else {
            debug!(
                water_level = sample.water_level,
                temperature = sample.temperature,
                humidity = sample.humidity,
                aqi = ?sample.air_quality_index,
                "sample stored"
            );
        }
    }
}

/// owner side of a spawned sampler
pub struct SamplerHandle {
    cancel: CancellationToken,
    state: watch::Receiver<LoopState>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// resolves once the loop reports `state`
    pub async fn wait_for(&mut self, state: LoopState) {
        // the sender only drops after publishing Stopped
        let _ = self.state.wait_for(|s| *s == state).await;
    }

    /// cancel the loop and wait for it to exit
    pub async fn stop(self) -> anyhow::Result<()> {
        self.cancel.cancel();
        self.task.await?;
        Ok(())
    }
}
