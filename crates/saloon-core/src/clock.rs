//! Wall-clock time.
//!
//! Timeouts are computed from [`Clock::now`] and "today" is the calendar
//! date of `now` in its own offset, so a draw exactly at midnight belongs
//! to the new day.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate};
use parking_lot::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant in the caller's local offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// The current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The machine's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: DateTime<FixedOffset>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(at("2024-05-01T12:00:00+03:00"));
        clock.advance(Duration::seconds(61));
        assert_eq!(clock.now(), at("2024-05-01T12:01:01+03:00"));
    }

    #[test]
    fn midnight_belongs_to_new_day() {
        let clock = ManualClock::new(at("2024-05-01T23:59:59+03:00"));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        clock.advance(Duration::seconds(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    #[test]
    fn today_uses_local_offset() {
        // 22:30 UTC is already the next day at +03:00.
        let clock = ManualClock::new(at("2024-05-01T22:30:00+00:00"));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        clock.set(at("2024-05-02T01:30:00+03:00"));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }
}
