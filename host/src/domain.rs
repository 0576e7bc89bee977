//! ==============================================================================
//! domain.rs - readings, samples and the json snapshot shape
//! ==============================================================================
//!
//! purpose:
//!     the data that flows from a reading source, through the store, out to
//!     the http endpoint.
//!
//! relationships:
//!     - produced by: source/* (Reading), sampler.rs (Sample)
//!     - stored by: store.rs
//!     - served by: server.rs (ReadingsSnapshot)
//!
//! ==============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// timestamp format used on the wire
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// output of one reading source invocation
///
/// a `None` field means that part of the read failed for this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub water_level: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub air_quality_index: Option<u16>,
}

/// one immutable sample held by the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// tank fill, percent (0-100)
    pub water_level: f64,
    /// celsius
    pub temperature: f64,
    /// relative humidity, percent (0-100)
    pub humidity: f64,
    /// 0-500, only from sources that measure it
    pub air_quality_index: Option<u16>,
    pub captured_at: NaiveDateTime,
}

impl Sample {
    pub fn timestamp(&self) -> String {
        self.captured_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// body of `GET /api/readings`
///
/// arrays are parallel and ordered oldest to newest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingsSnapshot {
    pub water_levels: Vec<f64>,
    pub temperatures: Vec<f64>,
    pub humidities: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi_levels: Option<Vec<u16>>,
    pub timestamps: Vec<String>,
    pub latest: LatestReading,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestReading {
    pub water_level: f64,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<u16>,
    pub timestamp: String,
}

impl ReadingsSnapshot {
    /// build the parallel-array view of `samples`
    ///
    /// `with_aqi` controls whether the aqi fields are present at all; a
    /// sample without an index contributes 0 to `aqi_levels`.
    pub fn from_samples<'a, I>(samples: I, with_aqi: bool) -> Self
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut snapshot = Self {
            aqi_levels: with_aqi.then(Vec::new),
            ..Self::default()
        };
        let mut last = None;

        for sample in samples {
            snapshot.water_levels.push(sample.water_level);
            snapshot.temperatures.push(sample.temperature);
            snapshot.humidities.push(sample.humidity);
            if let Some(levels) = snapshot.aqi_levels.as_mut() {
                levels.push(sample.air_quality_index.unwrap_or(0));
            }
            snapshot.timestamps.push(sample.timestamp());
            last = Some(sample);
        }

        snapshot.latest = match last {
            Some(sample) => LatestReading {
                water_level: sample.water_level,
                temperature: sample.temperature,
                humidity: sample.humidity,
                aqi: with_aqi.then(|| sample.air_quality_index.unwrap_or(0)),
                timestamp: sample.timestamp(),
            },
            None => LatestReading {
                aqi: with_aqi.then_some(0),
                ..LatestReading::default()
            },
        };
        snapshot
    }

    pub fn len(&self) -> usize {
        self.water_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.water_levels.is_empty()
    }
}

/// us epa aqi bands, as shown by the dashboard frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_index(aqi: u16) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthyForSensitiveGroups,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }
}

/// round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample(level: f64, aqi: Option<u16>, time: NaiveDateTime) -> Sample {
        Sample {
            water_level: level,
            temperature: 21.5,
            humidity: 48.0,
            air_quality_index: aqi,
            captured_at: time,
        }
    }

    #[test]
    fn test_empty_snapshot_defaults() {
        let snap = ReadingsSnapshot::from_samples(&Vec::<Sample>::new(), false);
        assert!(snap.is_empty());
        assert_eq!(snap.latest, LatestReading::default());
        assert!(snap.aqi_levels.is_none());

        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.get("aqi_levels").is_none());
        assert_eq!(json["latest"]["timestamp"], "");
        assert!(json["latest"].get("aqi").is_none());
    }

    #[test]
    fn test_empty_snapshot_with_aqi_reports_zero() {
        let snap = ReadingsSnapshot::from_samples(&Vec::<Sample>::new(), true);
        assert_eq!(snap.aqi_levels, Some(vec![]));
        assert_eq!(snap.latest.aqi, Some(0));
    }

    #[test]
    fn test_latest_mirrors_last_sample() {
        let samples = [
            sample(10.0, Some(30), at(9, 59, 58)),
            sample(12.5, Some(41), at(10, 0, 0)),
        ];
        let snap = ReadingsSnapshot::from_samples(&samples, true);
        assert_eq!(snap.timestamps, vec!["09:59:58", "10:00:00"]);
        assert_eq!(snap.aqi_levels, Some(vec![30, 41]));
        assert_eq!(snap.latest.water_level, 12.5);
        assert_eq!(snap.latest.aqi, Some(41));
        assert_eq!(snap.latest.timestamp, "10:00:00");
    }

    #[test]
    fn test_aqi_bands() {
        assert_eq!(AqiCategory::from_index(0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_index(50), AqiCategory::Good);
        assert_eq!(AqiCategory::from_index(51), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_index(150), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(AqiCategory::from_index(201), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_index(500).label(), "Hazardous");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(23.456, 1), 23.5);
        assert_eq!(round_to(12.344, 2), 12.34);
    }
}
