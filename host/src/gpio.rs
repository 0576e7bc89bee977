//! ==============================================================================
//! gpio.rs - hardware access for the tank and climate sensors
//! ==============================================================================
//!
//! purpose:
//!     - `EchoLine`: the trigger/echo pin pair of an hc-sr04 style ultrasonic
//!       ranger, plus `measure_echo()` which times one round trip.
//!     - `ClimateSensor`: anything that yields (temperature, humidity).
//!     - `Dht22Subprocess`: dht22 read through python's adafruit_dht.
//!     - `RppalEchoLine`: real pins through rppal (feature = "hardware").
//!
//! why subprocess to python?:
//!     dht22 sensors require precise bit-banging timing (~microseconds).
//!     pure rust in userspace is unreliable due to lack of real-time guarantees.
//!     adafruit_dht handles this correctly with retries and timing compensation.
//!
//! relationships:
//!     - used by: source/hardware.rs
//!
//! ==============================================================================

use crate::error::{EchoPhase, SensorError};
use std::time::{Duration, Instant};

/// length of the trigger pulse
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// trigger/echo pin pair of an ultrasonic ranger
pub trait EchoLine: Send {
    fn set_trigger(&mut self, high: bool);
    fn echo_is_high(&self) -> bool;
}

/// fire one trigger pulse and time the echo
///
/// each wait (echo rising, echo falling) has its own deadline of `timeout`.
/// the deadline is checked on every poll, so a stuck line returns an error
/// after at most `timeout` per phase.
pub fn measure_echo<L: EchoLine + ?Sized>(
    line: &mut L,
    timeout: Duration,
) -> Result<Duration, SensorError> {
    line.set_trigger(true);
    std::thread::sleep(TRIGGER_PULSE);
    line.set_trigger(false);

    let deadline = Instant::now() + timeout;
    while !line.echo_is_high() {
        if Instant::now() >= deadline {
            return Err(SensorError::EchoTimeout { phase: EchoPhase::Start });
        }
    }
    let pulse_start = Instant::now();

    let deadline = pulse_start + timeout;
    while line.echo_is_high() {
        if Instant::now() >= deadline {
            return Err(SensorError::EchoTimeout { phase: EchoPhase::End });
        }
    }

    Ok(pulse_start.elapsed())
}

/// temperature (celsius) and relative humidity (percent)
pub trait ClimateSensor: Send {
    fn read(&mut self) -> Result<(f64, f64), SensorError>;
}

/// dht22 on `pin`, read via python3 + adafruit_dht
pub struct Dht22Subprocess {
    pin: u8,
}

impl Dht22Subprocess {
    pub fn new(pin: u8) -> Self {
        Self { pin }
    }
}

impl ClimateSensor for Dht22Subprocess {
    fn read(&mut self) -> Result<(f64, f64), SensorError> {
        use std::process::Command;

        let script = format!(
            r#"
import sys
try:
    import adafruit_dht
    import board
    import json

    dht = adafruit_dht.DHT22(board.D{})

    try:
        t, h = dht.temperature, dht.humidity
        if t is not None and h is not None:
            print(json.dumps({{"t": t, "h": h}}))
        else:
            print("null")
    finally:
        dht.exit()
except Exception as e:
    print(str(e), file=sys.stderr)
    sys.exit(1)
"#,
            self.pin
        );

        let output = Command::new("python3")
            .arg("-c")
            .arg(&script)
            .output()
            .map_err(|e| SensorError::Climate(format!("failed to run python3: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SensorError::Climate(stderr.trim().to_string()));
        }

        parse_dht_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// parse the `{"t": .., "h": ..}` line printed by the dht script
pub fn parse_dht_output(stdout: &str) -> Result<(f64, f64), SensorError> {
    let stdout = stdout.trim();
    if stdout == "null" || stdout.is_empty() {
        return Err(SensorError::Climate("sensor returned null".into()));
    }

    let parsed: serde_json::Value = serde_json::from_str(stdout)
        .map_err(|e| SensorError::Climate(format!("json parse error: {} (got: {})", e, stdout)))?;

    let temp = parsed["t"]
        .as_f64()
        .ok_or_else(|| SensorError::Climate("missing temperature".into()))?;
    let humidity = parsed["h"]
        .as_f64()
        .ok_or_else(|| SensorError::Climate("missing humidity".into()))?;

    Ok((temp, humidity))
}

// ==============================================================================
// rppal pins (raspberry pi only)
// ==============================================================================

#[cfg(feature = "hardware")]
pub struct RppalEchoLine {
    trigger: rppal::gpio::OutputPin,
    echo: rppal::gpio::InputPin,
}

#[cfg(feature = "hardware")]
impl RppalEchoLine {
    /// claim the pins; trigger starts low. pins reset when dropped.
    pub fn open(trigger_pin: u8, echo_pin: u8) -> Result<Self, SensorError> {
        let gpio = rppal::gpio::Gpio::new()?;
        let mut trigger = gpio.get(trigger_pin)?.into_output();
        trigger.set_low();
        let echo = gpio.get(echo_pin)?.into_input();
        tracing::info!(trigger_pin, echo_pin, "ultrasonic pins ready");
        Ok(Self { trigger, echo })
    }
}

#[cfg(feature = "hardware")]
impl EchoLine for RppalEchoLine {
    fn set_trigger(&mut self, high: bool) {
        if high {
            self.trigger.set_high();
        } else {
            self.trigger.set_low();
        }
    }

    fn echo_is_high(&self) -> bool {
        self.echo.is_high()
    }
}
