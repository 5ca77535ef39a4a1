//! Wall-clock source for "today" decisions.

use chrono::{Local, NaiveDateTime};

/// Supplies the operator-local current time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time zone. No conversion is applied afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant; used by tests and replay tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
