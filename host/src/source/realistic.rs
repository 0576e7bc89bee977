//! ==============================================================================
//! realistic.rs - simulated tank, climate and air quality
//! ==============================================================================
//!
//! purpose:
//!     produce readings that look like a real installation: slow trends,
//!     a day/night cycle and a little sensor noise, instead of white noise.
//!
//! model:
//!     water level  every 5 minutes a scenario picks a new target; each tick
//!                  the level closes 2-5% of the remaining gap, plus noise.
//!     temperature  base + 5 * diurnal factor + persistent variation + noise.
//!     humidity     base - 15 * diurnal factor + persistent variation + noise.
//!     aqi          every 30-60 minutes an hour-dependent trend is chosen;
//!                  each tick nudges a cumulative variation in its direction.
//!
//! time comes from the injected `Clock` and randomness from the injected rng,
//! so a `ManualClock` plus a seeded `StdRng` replays exactly.
//!
//! ==============================================================================

use super::ReadingSource;
use crate::clock::Clock;
use crate::domain::{round_to, Reading};
use crate::error::SensorError;
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::f64::consts::PI;
use std::sync::Arc;

const INITIAL_WATER_LEVEL: f64 = 70.0;
const WATER_TARGET_REFRESH_SECS: i64 = 300;

const BASE_TEMPERATURE: f64 = 23.0;
const TEMPERATURE_SWING: f64 = 5.0;
const BASE_HUMIDITY: f64 = 50.0;
const HUMIDITY_SWING: f64 = 15.0;

const BASE_AQI: f64 = 35.0;
const AQI_TREND_REFRESH_SECS: (i64, i64) = (1800, 3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterScenario {
    /// slow draw-down, 1-10%
    NormalConsumption,
    /// 10-30% up
    Refill,
    /// 15-25% down
    RapidLoss,
    /// within 1%
    Stable,
}

impl WaterScenario {
    const WEIGHTED: [(WaterScenario, f64); 4] = [
        (Self::NormalConsumption, 0.4),
        (Self::Refill, 0.3),
        (Self::RapidLoss, 0.2),
        (Self::Stable, 0.1),
    ];

    fn target_from<R: Rng + ?Sized>(self, current: f64, rng: &mut R) -> f64 {
        let target = match self {
            Self::NormalConsumption => current - rng.random_range(1.0..=10.0),
            Self::Refill => current + rng.random_range(10.0..=30.0),
            Self::RapidLoss => current - rng.random_range(15.0..=25.0),
            Self::Stable => current + rng.random_range(-1.0..=1.0),
        };
        target.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiTrend {
    Improving,
    Stable,
    Worsening,
}

impl AqiTrend {
    pub fn direction(self) -> i8 {
        match self {
            Self::Improving => -1,
            Self::Stable => 0,
            Self::Worsening => 1,
        }
    }

    /// (improving, stable, worsening) weights for an hour of the day
    pub fn weights_at(hour: u32) -> [(AqiTrend, f64); 3] {
        let (improving, stable, worsening) = match hour {
            // rush hours
            7..=9 | 16..=19 => (0.2, 0.3, 0.5),
            // night
            22..=23 | 0..=5 => (0.6, 0.3, 0.1),
            _ => (0.4, 0.2, 0.4),
        };
        [
            (Self::Improving, improving),
            (Self::Stable, stable),
            (Self::Worsening, worsening),
        ]
    }
}

/// hidden variables carried from tick to tick
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorState {
    pub current_water_level: f64,
    pub target_water_level: f64,
    pub last_water_change_time: NaiveDateTime,
    pub temp_variation: f64,
    pub humidity_variation: f64,
    pub aqi_variation: f64,
    pub aqi_trend: AqiTrend,
    pub last_aqi_trend_change_time: NaiveDateTime,
    /// how long the current aqi trend lasts
    pub aqi_trend_period: TimeDelta,
}

/// time-of-day factor in [-1, 1]
///
/// -1 at 05:00, +1 at 15:00. rises along a half cosine for 10 hours, then
/// falls along another for the remaining 14, so it is continuous at both
/// turning points. `hour` may be fractional.
pub fn diurnal_factor(hour: f64) -> f64 {
    let hour = hour.rem_euclid(24.0);
    if (5.0..=15.0).contains(&hour) {
        -((hour - 5.0) * PI / 10.0).cos()
    } else {
        let since_peak = if hour > 15.0 { hour - 15.0 } else { hour + 9.0 };
        (since_peak * PI / 14.0).cos()
    }
}

fn fractional_hour(time: NaiveDateTime) -> f64 {
    f64::from(time.hour()) + f64::from(time.minute()) / 60.0 + f64::from(time.second()) / 3600.0
}

pub struct RealisticSource<R = StdRng> {
    rng: R,
    clock: Arc<dyn Clock>,
    state: GeneratorState,
}

impl<R: Rng + Send> RealisticSource<R> {
    pub fn new(mut rng: R, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let aqi_trend_period = Self::draw_trend_period(&mut rng);
        Self {
            rng,
            clock,
            state: GeneratorState {
                current_water_level: INITIAL_WATER_LEVEL,
                target_water_level: INITIAL_WATER_LEVEL,
                last_water_change_time: now,
                temp_variation: 0.0,
                humidity_variation: 0.0,
                aqi_variation: 0.0,
                aqi_trend: AqiTrend::Stable,
                last_aqi_trend_change_time: now,
                aqi_trend_period,
            },
        }
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    fn draw_trend_period(rng: &mut R) -> TimeDelta {
        let (lo, hi) = AQI_TREND_REFRESH_SECS;
        TimeDelta::seconds(rng.random_range(lo..=hi))
    }

    fn next_water_level(&mut self, now: NaiveDateTime) -> f64 {
        let state = &mut self.state;

        if (now - state.last_water_change_time).num_seconds() >= WATER_TARGET_REFRESH_SECS {
            let scenario = WaterScenario::WEIGHTED
                .choose_weighted(&mut self.rng, |(_, weight)| *weight)
                .map(|(scenario, _)| *scenario)
                .unwrap_or(WaterScenario::Stable);
            state.target_water_level = scenario.target_from(state.current_water_level, &mut self.rng);
            state.last_water_change_time = now;
            tracing::debug!(?scenario, target = state.target_water_level, "new water level target");
        }

        let gap = state.target_water_level - state.current_water_level;
        state.current_water_level += gap * self.rng.random_range(0.02..=0.05);

        let noise = self.rng.random_range(-0.2..=0.2);
        round_to((state.current_water_level + noise).clamp(0.0, 100.0), 1)
    }

    fn next_climate(&mut self, now: NaiveDateTime) -> (f64, f64) {
        let factor = diurnal_factor(fractional_hour(now));
        let state = &mut self.state;

        state.temp_variation =
            (state.temp_variation * 0.95 + self.rng.random_range(-0.3..=0.3)).clamp(-3.0, 3.0);
        let temperature = BASE_TEMPERATURE
            + TEMPERATURE_SWING * factor
            + state.temp_variation
            + self.rng.random_range(-0.2..=0.2);

        state.humidity_variation =
            (state.humidity_variation * 0.98 + self.rng.random_range(-0.2..=0.2)).clamp(-5.0, 5.0);
        let noise = self.rng.random_range(-0.5..=0.5);
        let humidity = humidity_from(factor, state.humidity_variation, noise);

        (round_to(temperature, 1), round_to(humidity, 1))
    }

    fn next_aqi(&mut self, now: NaiveDateTime) -> u16 {
        if now - self.state.last_aqi_trend_change_time >= self.state.aqi_trend_period {
            let trend = AqiTrend::weights_at(now.hour())
                .choose_weighted(&mut self.rng, |(_, weight)| *weight)
                .map(|(trend, _)| *trend)
                .unwrap_or(AqiTrend::Stable);
            self.state.aqi_trend = trend;
            self.state.last_aqi_trend_change_time = now;
            self.state.aqi_trend_period = Self::draw_trend_period(&mut self.rng);
            tracing::debug!(?trend, "new aqi trend");
        }

        let nudge = match self.state.aqi_trend {
            AqiTrend::Stable => self.rng.random_range(-0.3..=0.3),
            trend => f64::from(trend.direction()) * self.rng.random_range(0.0..=0.7),
        };
        self.state.aqi_variation = (self.state.aqi_variation + nudge).clamp(-15.0, 100.0);

        aqi_from(self.state.aqi_variation, self.rng.random_range(-0.5..=0.5))
    }
}

/// relative humidity, clamped to [20, 95]
fn humidity_from(factor: f64, variation: f64, noise: f64) -> f64 {
    (BASE_HUMIDITY - HUMIDITY_SWING * factor + variation + noise).clamp(20.0, 95.0)
}

/// final index, clamped to [0, 500] and rounded
fn aqi_from(variation: f64, noise: f64) -> u16 {
    (BASE_AQI + variation + noise).clamp(0.0, 500.0).round() as u16
}

impl<R: Rng + Send> ReadingSource for RealisticSource<R> {
    fn name(&self) -> &'static str {
        "realistic"
    }

    fn reports_aqi(&self) -> bool {
        true
    }

    fn read(&mut self) -> Result<Reading, SensorError> {
        let now = self.clock.now();
        let water_level = self.next_water_level(now);
        let (temperature, humidity) = self.next_climate(now);
        let aqi = self.next_aqi(now);

        Ok(Reading {
            water_level: Some(water_level),
            temperature: Some(temperature),
            humidity: Some(humidity),
            air_quality_index: Some(aqi),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn clock_at(hour: u32) -> Arc<ManualClock> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Arc::new(ManualClock::new(start))
    }

    fn source(seed: u64, clock: &Arc<ManualClock>) -> RealisticSource<StdRng> {
        RealisticSource::new(StdRng::seed_from_u64(seed), clock.clone())
    }

    #[test]
    fn test_diurnal_extremes() {
        assert!((diurnal_factor(15.0) - 1.0).abs() < 1e-9);
        assert!((diurnal_factor(5.0) + 1.0).abs() < 1e-9);
        let hourly: Vec<f64> = (0..24).map(|h| diurnal_factor(f64::from(h))).collect();
        let max_hour = (0..24).max_by(|a, b| hourly[*a].total_cmp(&hourly[*b])).unwrap();
        let min_hour = (0..24).min_by(|a, b| hourly[*a].total_cmp(&hourly[*b])).unwrap();
        assert_eq!(max_hour, 15);
        assert_eq!(min_hour, 5);
    }

    #[test]
    fn test_diurnal_sweep_is_monotonic_between_turning_points() {
        let f = |h: u32| diurnal_factor(f64::from(h));
        for h in 5..15 {
            assert!(f(h + 1) > f(h), "should rise from {} to {}", h, h + 1);
        }
        for h in 15..23 {
            assert!(f(h + 1) < f(h), "should fall from {} to {}", h, h + 1);
        }
        assert!(f(0) < f(23));
        for h in 0..5 {
            assert!(f(h + 1) < f(h), "should fall from {} to {}", h, h + 1);
        }
    }

    #[test]
    fn test_temperature_follows_day_without_noise() {
        // with every random term at zero the temperature is the diurnal curve
        let temperature = |h: u32| BASE_TEMPERATURE + TEMPERATURE_SWING * diurnal_factor(f64::from(h));
        assert_eq!(temperature(15), 28.0);
        assert_eq!(temperature(5), 18.0);
        let humidity = |h: u32| BASE_HUMIDITY - HUMIDITY_SWING * diurnal_factor(f64::from(h));
        assert_eq!(humidity(15), 35.0);
        assert_eq!(humidity(5), 65.0);
    }

    #[test]
    fn test_readings_stay_in_bounds() {
        let clock = clock_at(0);
        let mut src = source(1, &clock);
        for _ in 0..5000 {
            clock.advance(TimeDelta::seconds(37));
            let r = src.read().unwrap();
            let level = r.water_level.unwrap();
            let temp = r.temperature.unwrap();
            let hum = r.humidity.unwrap();
            let aqi = r.air_quality_index.unwrap();
            assert!((0.0..=100.0).contains(&level));
            assert!((14.8..=31.2).contains(&temp), "temperature {}", temp);
            assert!((20.0..=95.0).contains(&hum));
            assert!(aqi <= 136, "aqi {}", aqi);
        }
    }

    #[test]
    fn test_water_target_holds_until_refresh() {
        let clock = clock_at(12);
        let mut src = source(2, &clock);
        for _ in 0..10 {
            clock.advance(TimeDelta::seconds(2));
            src.read().unwrap();
        }
        assert_eq!(src.state().target_water_level, INITIAL_WATER_LEVEL);

        clock.advance(TimeDelta::seconds(300));
        src.read().unwrap();
        assert_eq!(src.state().last_water_change_time, clock.now());
        let target = src.state().target_water_level;
        assert!((0.0..=100.0).contains(&target));
        assert!((target - INITIAL_WATER_LEVEL).abs() <= 30.0);
    }

    #[test]
    fn test_water_level_approaches_target_exponentially() {
        let clock = clock_at(12);
        let mut src = source(3, &clock);
        src.state.current_water_level = 0.0;
        src.state.target_water_level = 100.0;

        src.read().unwrap();
        let first = src.state().current_water_level;
        assert!((2.0..=5.0).contains(&first), "moved {}", first);

        let gap_before = 100.0 - first;
        src.read().unwrap();
        let step = src.state().current_water_level - first;
        assert!(step >= gap_before * 0.02 - 1e-9 && step <= gap_before * 0.05 + 1e-9);
    }

    #[test]
    fn test_scenario_targets_are_clamped() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            assert_eq!(WaterScenario::Refill.target_from(95.0, &mut rng), 100.0);
            assert_eq!(WaterScenario::RapidLoss.target_from(10.0, &mut rng), 0.0);
            let stable = WaterScenario::Stable.target_from(50.0, &mut rng);
            assert!((49.0..=51.0).contains(&stable));
            let consumed = WaterScenario::NormalConsumption.target_from(50.0, &mut rng);
            assert!((40.0..=49.0).contains(&consumed));
        }
    }

    #[test]
    fn test_aqi_trend_refreshes_after_period() {
        let clock = clock_at(8);
        let mut src = source(5, &clock);
        let period = src.state().aqi_trend_period;
        assert!(period >= TimeDelta::seconds(1800) && period <= TimeDelta::seconds(3600));

        clock.advance(TimeDelta::seconds(1799));
        src.read().unwrap();
        assert_eq!(src.state().aqi_trend, AqiTrend::Stable);
        assert_ne!(src.state().last_aqi_trend_change_time, clock.now());

        clock.advance(TimeDelta::seconds(1801));
        src.read().unwrap();
        assert_eq!(src.state().last_aqi_trend_change_time, clock.now());
    }

    #[test]
    fn test_aqi_variation_is_clamped() {
        let clock = clock_at(8);
        let mut src = source(6, &clock);
        src.state.aqi_trend = AqiTrend::Worsening;
        src.state.aqi_variation = 99.9;
        src.state.aqi_trend_period = TimeDelta::days(365);
        for _ in 0..200 {
            let aqi = src.read().unwrap().air_quality_index.unwrap();
            assert!(src.state().aqi_variation <= 100.0);
            assert!(aqi <= 136);
        }

        src.state.aqi_trend = AqiTrend::Improving;
        for _ in 0..500 {
            src.read().unwrap();
            assert!(src.state().aqi_variation >= -15.0);
        }
        assert_eq!(src.state().aqi_variation, -15.0);
    }

    #[test]
    fn test_humidity_clamps_to_comfort_band() {
        assert_eq!(humidity_from(0.0, 0.0, 0.0), 50.0);
        assert_eq!(humidity_from(1.0, -40.0, -0.5), 20.0);
        assert_eq!(humidity_from(-1.0, 60.0, 0.5), 95.0);
        assert_eq!(humidity_from(-1.0, 1e6, 0.0), 95.0);
        assert_eq!(humidity_from(1.0, -1e6, 0.0), 20.0);
    }

    #[test]
    fn test_aqi_clamps_to_index_range() {
        assert_eq!(aqi_from(0.0, 0.0), 35);
        assert_eq!(aqi_from(10.0, 0.4), 45);
        assert_eq!(aqi_from(-60.0, 0.0), 0);
        assert_eq!(aqi_from(-1e6, -0.5), 0);
        assert_eq!(aqi_from(600.0, 0.0), 500);
        assert_eq!(aqi_from(1e6, 0.5), 500);
    }

    #[test]
    fn test_improving_trend_lowers_variation() {
        let clock = clock_at(2);
        let mut src = source(8, &clock);
        src.state.aqi_trend = AqiTrend::Improving;
        src.state.aqi_variation = 20.0;
        src.state.aqi_trend_period = TimeDelta::days(365);
        let mut previous = src.state().aqi_variation;
        for _ in 0..20 {
            src.read().unwrap();
            assert!(src.state().aqi_variation <= previous);
            previous = src.state().aqi_variation;
        }
        assert!(previous < 20.0);
    }

    #[test]
    fn test_trend_weights_by_hour() {
        let weight = |hour, trend| {
            AqiTrend::weights_at(hour)
                .iter()
                .find(|(t, _)| *t == trend)
                .map(|(_, w)| *w)
                .unwrap()
        };
        assert_eq!(weight(8, AqiTrend::Worsening), 0.5);
        assert_eq!(weight(17, AqiTrend::Worsening), 0.5);
        assert_eq!(weight(23, AqiTrend::Improving), 0.6);
        assert_eq!(weight(3, AqiTrend::Improving), 0.6);
        assert_eq!(weight(12, AqiTrend::Stable), 0.2);
        for hour in 0..24 {
            let total: f64 = AqiTrend::weights_at(hour).iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_seed_and_clock_replay() {
        let clock_a = clock_at(6);
        let clock_b = clock_at(6);
        let mut a = source(11, &clock_a);
        let mut b = source(11, &clock_b);
        for _ in 0..200 {
            clock_a.advance(TimeDelta::seconds(61));
            clock_b.advance(TimeDelta::seconds(61));
            assert_eq!(a.read().unwrap(), b.read().unwrap());
        }
    }
}
