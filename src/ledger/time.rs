use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Clock abstracts access to the current timestamp so the ledger stays deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that starts at a fixed instant and advances by `step` on every read.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// A clock that always returns `instant`.
    pub fn fixed(instant: DateTime<Utc>) -> Self {
        Self::new(instant, Duration::zero())
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut guard = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = *guard;
        *guard = current + self.step;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stepping_clock_advances_per_read() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = SteppingClock::new(start, Duration::milliseconds(5));
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::milliseconds(5));
    }

    #[test]
    fn fixed_clock_never_moves() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let clock = SteppingClock::fixed(instant);
        assert_eq!(clock.now(), clock.now());
    }
}
