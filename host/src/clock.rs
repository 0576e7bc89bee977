//! wall clock abstraction
//!
//! the realistic generator and the sampler ask a `Clock` for the local time
//! instead of reading it directly, so tests can step time by hand.

use chrono::{Local, NaiveDateTime, TimeDelta};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    /// current local wall-clock time
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // a panicking test thread must not wedge the clock for the others
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_manual_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let clock = ManualClock::new(start);
        clock.advance(TimeDelta::seconds(90));
        assert_eq!(clock.now().hour(), 0);
        assert_eq!(clock.now().minute(), 0);
        assert_eq!(clock.now().second(), 30);
    }

    #[test]
    fn test_system_clock_is_after_2024() {
        let year = SystemClock.now().format("%Y").to_string();
        assert!(year.parse::<i32>().unwrap() >= 2024);
    }
}
