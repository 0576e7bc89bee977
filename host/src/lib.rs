//! tank telemetry server
//!
//! a background task samples water level, temperature, humidity and (for the
//! simulated source) air quality every couple of seconds into a bounded
//! window; `GET /api/readings` hands that window to the dashboard.
//!
//! ```text
//!   sampler (2s) ──read──> ReadingSource      http GET /api/readings
//!        │                                          │
//!        └──push──> ReadingStore <──snapshot────────┘
//! ```

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod gpio;
pub mod sampler;
pub mod server;
pub mod source;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HostConfig;
pub use domain::{LatestReading, Reading, ReadingsSnapshot, Sample};
pub use error::SensorError;
pub use sampler::{LoopState, Sampler, SamplerHandle};
pub use source::ReadingSource;
pub use store::ReadingStore;
