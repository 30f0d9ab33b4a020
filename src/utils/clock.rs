use chrono::{DateTime, Local, TimeZone, Timelike};

/// Source of the current time. Injected so time-of-day risk is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Local hour of day, 0..=23
    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Local>,
}

impl FixedClock {
    pub fn new(at: DateTime<Local>) -> Self {
        FixedClock { at }
    }

    /// Frozen at the given local hour on a fixed mid-January date (no DST transition)
    pub fn at_hour(hour: u32) -> Self {
        let at = Local
            .with_ymd_and_hms(2025, 1, 15, hour.min(23), 30, 0)
            .earliest()
            .unwrap_or_else(Local::now);
        FixedClock { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_hour() {
        for hour in [0, 3, 5, 6, 14, 23] {
            assert_eq!(FixedClock::at_hour(hour).hour(), hour);
        }
    }

    #[test]
    fn test_fixed_clock_is_frozen() {
        let clock = FixedClock::at_hour(9);
        assert_eq!(clock.now(), clock.now());
    }
}
