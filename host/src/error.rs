//! sensor fault taxonomy
//!
//! every variant is transient: the sampler zeroes the affected field(s),
//! logs, and carries on with the next tick.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// echo line did not change level before the deadline
    #[error("ultrasonic echo timed out waiting for pulse {phase}")]
    EchoTimeout { phase: EchoPhase },

    /// temperature/humidity sensor returned nothing usable
    #[error("climate sensor read failed: {0}")]
    Climate(String),

    #[error("gpio error: {0}")]
    Gpio(String),

    /// hardware source requested from a build without gpio support
    #[error("{0} is not available in this build (enable the `hardware` feature)")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoPhase {
    Start,
    End,
}

impl fmt::Display for EchoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

#[cfg(feature = "hardware")]
impl From<rppal::gpio::Error> for SensorError {
    fn from(e: rppal::gpio::Error) -> Self {
        Self::Gpio(e.to_string())
    }
}
