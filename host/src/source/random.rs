//! uniform random readings with no memory between ticks

use super::ReadingSource;
use crate::domain::{round_to, Reading};
use crate::error::SensorError;
use rand::rngs::StdRng;
use rand::Rng;

pub struct RandomSource<R = StdRng> {
    rng: R,
}

impl<R: Rng + Send> RandomSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> ReadingSource for RandomSource<R> {
    fn name(&self) -> &'static str {
        "random"
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        Ok(Reading {
            water_level: Some(self.rng.random_range(0.0..=100.0)),
            temperature: Some(round_to(self.rng.random_range(20.0..=30.0), 1)),
            humidity: Some(round_to(self.rng.random_range(40.0..=60.0), 1)),
            air_quality_index: None,
        })
    }
}
